//! Enemy spawning, movement and attacks, including the boss

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

use super::registry::{Entity, EntityId};
use super::state::{
    AttackPattern, Body, BossBrain, BossPhase, Bullet, BulletBehavior, Enemy, EnemyKind,
    GameEvent, GameState, Owner, SoundCue,
};
use crate::angle_of;
use crate::consts::*;

/// Regular enemies enter this far above the field
const SPAWN_Y: f32 = -50.0;
/// Enemies past this depth are culled
const CULL_Y: f32 = FIELD_HEIGHT + 100.0;

const BOSS_SPAWN: Vec2 = Vec2::new(FIELD_WIDTH / 2.0, -150.0);
const BOSS_SIZE: Vec2 = Vec2::new(140.0, 120.0);
/// Depth at which the boss stops descending
const BOSS_HOVER_Y: f32 = 150.0;
const BOSS_RING_SPEED: f32 = 5.0;
const BOSS_VOLLEY_SPEED: f32 = 7.0;

/// Frames between regular spawns at `level`
pub fn spawn_interval(level: u32) -> u32 {
    50u32.saturating_sub(level.saturating_mul(5)).max(15)
}

/// Regular enemy hp scaling
pub fn hp_multiplier(level: u32) -> f32 {
    1.0 + 0.3 * level.saturating_sub(1) as f32
}

pub fn boss_hp(level: u32) -> f32 {
    EnemyKind::Boss(boss_brain(level)).stats().hp * (1.0 + 0.5 * level.saturating_sub(1) as f32)
}

pub fn boss_score(level: u32) -> u64 {
    EnemyKind::Boss(boss_brain(level)).stats().score * level.max(1) as u64
}

fn boss_rate(level: u32) -> f32 {
    (1.0 - 0.1 * level as f32).max(0.5)
}

/// Frames between radial rings
pub fn ring_interval(level: u32, frenzied: bool) -> u32 {
    let base = (40.0 * boss_rate(level)).floor();
    let frames = if frenzied { (base * 0.6).floor() } else { base };
    (frames as u32).max(1)
}

/// Frames between aimed triple-shots
pub fn volley_interval(level: u32) -> u32 {
    ((90.0 * boss_rate(level)).floor() as u32).max(1)
}

pub fn ring_count(frenzied: bool) -> usize {
    if frenzied { 24 } else { 16 }
}

fn boss_brain(level: u32) -> BossBrain {
    BossBrain {
        phase: BossPhase::Entering,
        age: 0,
        ring_cooldown: ring_interval(level, false),
        volley_cooldown: volley_interval(level),
    }
}

/// Spawn a regular enemy of `kind` at `pos`, scaled to the current level
pub fn spawn_regular(state: &mut GameState, kind: EnemyKind, pos: Vec2) -> EntityId {
    let stats = kind.stats();
    let hp = stats.hp * hp_multiplier(state.level);
    let shoot_timer = state.rng.random_range(0..60);
    let pattern_offset = state.rng.random::<f32>() * 100.0;
    state.registry.spawn_enemy(|id| Enemy {
        body: Body::new(
            id,
            pos,
            Vec2::new(0.0, stats.speed),
            Vec2::splat(stats.size),
            stats.color,
        ),
        hp,
        max_hp: hp,
        kind,
        pattern: stats.pattern,
        score_value: stats.score,
        shoot_timer,
        pattern_offset,
    })
}

/// Spawn the level's boss at the top of the field
pub fn spawn_boss(state: &mut GameState) -> EntityId {
    let level = state.level;
    let kind = EnemyKind::Boss(boss_brain(level));
    let stats = kind.stats();
    let hp = boss_hp(level);
    state.boss_active = true;
    let id = state.registry.spawn_enemy(|id| Enemy {
        body: Body::new(id, BOSS_SPAWN, Vec2::new(0.0, stats.speed), BOSS_SIZE, stats.color),
        hp,
        max_hp: hp,
        kind,
        pattern: stats.pattern,
        score_value: boss_score(level),
        shoot_timer: 0,
        pattern_offset: 0.0,
    });
    log::info!("Boss spawned for level {} ({} hp)", level, hp);
    state.emit(GameEvent::BossSpawned { level });
    id
}

/// Spawn step: regular cadence, then the boss rule
pub fn update_spawner(state: &mut GameState) {
    if !state.boss_active {
        state.spawn_cooldown = state.spawn_cooldown.saturating_sub(1);
        if state.spawn_cooldown == 0 {
            state.spawn_cooldown = spawn_interval(state.level);
            let x = state.rng.random::<f32>() * (FIELD_WIDTH - 60.0) + 30.0;
            let kind = EnemyKind::roll(state.rng.random::<f32>());
            spawn_regular(state, kind, Vec2::new(x, SPAWN_Y));
        }
    }
    check_boss_spawn(state);
}

/// Spawn the boss once the score threshold is met and the field is clear.
/// Returns true if a boss was spawned.
pub fn check_boss_spawn(state: &mut GameState) -> bool {
    if state.boss_active
        || state.score < state.next_boss_threshold
        || state.registry.enemies.live_count() > 0
    {
        return false;
    }
    spawn_boss(state);
    true
}

/// Enemy shot queued during the update pass
struct Shot {
    pos: Vec2,
    angle: f32,
    speed: f32,
}

pub(crate) fn spawn_enemy_bullet(state: &mut GameState, pos: Vec2, angle: f32, speed: f32) {
    state.registry.spawn_bullet(|id| {
        Bullet::new(
            id,
            Owner::Enemy,
            pos,
            angle,
            speed,
            ENEMY_BULLET_DAMAGE,
            BulletBehavior::Normal,
        )
    });
}

fn regular_attack(enemy: &Enemy, target: Vec2, shots: &mut Vec<Shot>) {
    let pos = enemy.body.pos;
    match enemy.pattern {
        AttackPattern::Straight => shots.push(Shot {
            pos,
            angle: angle_of(target - pos),
            speed: BULLET_SPEED_ENEMY,
        }),
        AttackPattern::Aimed => {
            let muzzle = pos + Vec2::new(0.0, 10.0);
            shots.push(Shot {
                pos: muzzle,
                angle: angle_of(target - muzzle),
                speed: BULLET_SPEED_ENEMY * 1.5,
            });
        }
        AttackPattern::Spread => {
            let muzzle = pos + Vec2::new(0.0, 20.0);
            for spread in [0.0, -0.4, 0.4] {
                shots.push(Shot {
                    pos: muzzle,
                    angle: FRAC_PI_2 + spread,
                    speed: BULLET_SPEED_ENEMY,
                });
            }
        }
        // Rings are driven by the boss brain
        AttackPattern::Spiral => {}
    }
}

/// Advance the boss state machine. Returns true if a ring was fired.
fn update_boss(
    body: &mut Body,
    brain: &mut BossBrain,
    frenzied: bool,
    level: u32,
    target: Vec2,
    shots: &mut Vec<Shot>,
) -> bool {
    brain.age += 1;
    match brain.phase {
        BossPhase::Entering => {
            body.pos.y += body.vel.y;
            if body.pos.y >= BOSS_HOVER_Y {
                brain.phase = BossPhase::Hovering;
            }
        }
        BossPhase::Hovering => {
            let t = brain.age as f32;
            body.pos.x += (t / 60.0).sin() * 1.5;
            body.pos.y += (t / 40.0).cos() * 0.5;
            let half = body.half_extents().x;
            body.pos.x = body.pos.x.clamp(half, FIELD_WIDTH - half);
        }
    }

    let pos = body.pos;
    let mut ring_fired = false;

    // Frenzy takes effect on the pending countdown, not just the next one
    let ring_every = ring_interval(level, frenzied);
    brain.ring_cooldown = brain.ring_cooldown.min(ring_every).saturating_sub(1);
    if brain.ring_cooldown == 0 {
        brain.ring_cooldown = ring_every;
        let count = ring_count(frenzied);
        let phase = brain.age as f32 / 50.0;
        for i in 0..count {
            shots.push(Shot {
                pos,
                angle: TAU / count as f32 * i as f32 + phase,
                speed: BOSS_RING_SPEED,
            });
        }
        ring_fired = true;
    }

    brain.volley_cooldown = brain.volley_cooldown.saturating_sub(1);
    if brain.volley_cooldown == 0 {
        brain.volley_cooldown = volley_interval(level);
        let angle = angle_of(target - pos);
        for offset in [Vec2::new(-40.0, 20.0), Vec2::new(40.0, 20.0), Vec2::new(0.0, 50.0)] {
            shots.push(Shot {
                pos: pos + offset,
                angle,
                speed: BOSS_VOLLEY_SPEED,
            });
        }
    }

    ring_fired
}

/// Move every enemy, run its attack timers and cull leavers
pub fn update_enemies(state: &mut GameState) {
    let target = state.player().pos();
    let level = state.level;
    let mut shots = Vec::new();
    let mut rings = 0;

    for enemy in state.registry.enemies.live_mut() {
        let frenzied = enemy.is_frenzied();
        if let EnemyKind::Boss(brain) = &mut enemy.kind {
            if update_boss(&mut enemy.body, brain, frenzied, level, target, &mut shots) {
                rings += 1;
            }
            continue;
        }

        enemy.body.pos.y += enemy.body.vel.y;
        match enemy.kind {
            EnemyKind::Fighter => {
                enemy.body.pos.x += ((enemy.body.pos.y + enemy.pattern_offset) / 40.0).sin() * 3.0;
            }
            EnemyKind::Interceptor => {
                enemy.body.pos.x += (target.x - enemy.body.pos.x) * 0.02;
            }
            _ => {}
        }

        enemy.shoot_timer += 1;
        if enemy.shoot_timer > enemy.kind.stats().shot_cooldown {
            enemy.shoot_timer = 0;
            regular_attack(enemy, target, &mut shots);
        }

        if enemy.body.pos.y > CULL_Y {
            enemy.kill();
        }
    }

    for shot in shots {
        spawn_enemy_bullet(state, shot.pos, shot.angle, shot.speed);
    }
    for _ in 0..rings {
        state.play(SoundCue::Shoot);
    }
}
