//! Collision detection and damage resolution
//!
//! Runs after every position update of the frame. Both passes only flag
//! entities for deletion; compaction happens later in the tick, so a pass
//! can still look at something another pass already killed.

use glam::Vec2;

use super::effects;
use super::powerup;
use super::registry::Entity;
use super::state::{Enemy, GameEvent, GamePhase, GameState, Owner, SoundCue};
use crate::consts::*;

/// Radius around a boss's centre where hits are critical
pub const WEAK_POINT_RADIUS: f32 = 20.0;
pub const CRITICAL_MULTIPLIER: f32 = 3.0;
const CRITICAL_COLOR: u32 = 0xfde047;
const WHITE: u32 = 0xffffff;

/// Box overlap test on centres and full sizes
#[inline]
pub fn aabb_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    let gap = (a_pos - b_pos).abs();
    let reach = (a_size + b_size) * 0.5;
    gap.x < reach.x && gap.y < reach.y
}

/// Subtract hp from an enemy. True only for the blow that kills it;
/// an enemy already flagged takes no further damage.
pub fn apply_damage(enemy: &mut Enemy, amount: f32) -> bool {
    if enemy.is_dead() {
        return false;
    }
    enemy.hp -= amount;
    if enemy.hp <= 0.0 {
        enemy.kill();
        return true;
    }
    false
}

/// What a destroyed enemy leaves behind
#[derive(Debug, Clone, Copy)]
pub struct Wreck {
    pub pos: Vec2,
    pub color: u32,
    pub score: u64,
    pub boss: bool,
}

impl Wreck {
    pub fn of(enemy: &Enemy) -> Self {
        Self {
            pos: enemy.body.pos,
            color: enemy.body.color,
            score: enemy.score_value,
            boss: enemy.is_boss(),
        }
    }
}

/// Death side effects: score, effects, loot, and for a boss the level advance
pub fn destroy_enemy(state: &mut GameState, wreck: Wreck) {
    state.score += wreck.score;
    state.play(SoundCue::Explode);

    if !wreck.boss {
        effects::explosion(state, wreck.pos, 15, wreck.color);
        effects::debris(state, wreck.pos, 4, wreck.color);
        state.shake(2.0);
        powerup::try_drop(state, wreck.pos);
        return;
    }

    let defeated = state.level;
    effects::explosion(state, wreck.pos, 60, wreck.color);
    effects::debris(state, wreck.pos, 16, wreck.color);
    effects::shockwave(state, wreck.pos, 20.0, WHITE);
    state.shake(20.0);

    powerup::drop_boss_loot(state, wreck.pos, defeated);
    state.clear_enemy_bullets();
    if state.player().is_alive() {
        state.player_mut().heal(BOSS_HEAL);
    }

    state.boss_active = false;
    state.level += 1;
    state.next_boss_threshold = state.score + BOSS_SCORE_THRESHOLD * state.level as u64;
    state.level_transition_timer = LEVEL_TRANSITION_FRAMES;

    log::info!(
        "Boss defeated, advancing to level {} (next boss at {})",
        state.level,
        state.next_boss_threshold
    );
    state.emit(GameEvent::BossDefeated { level: defeated });
}

/// Player bullets against enemies
pub fn resolve_player_fire(state: &mut GameState) {
    let registry = &mut state.registry;
    let mut sparks = Vec::new();
    let mut crits = Vec::new();
    let mut wrecks = Vec::new();

    for bullet in registry.bullets.live_mut() {
        if !bullet.is_player_owned() {
            continue;
        }
        for enemy in registry.enemies.live_mut() {
            if !aabb_overlap(bullet.body.pos, bullet.body.size, enemy.body.pos, enemy.body.size) {
                continue;
            }

            let critical =
                enemy.is_boss() && bullet.body.pos.distance(enemy.body.pos) < WEAK_POINT_RADIUS;
            let damage = if critical {
                bullet.damage * CRITICAL_MULTIPLIER
            } else {
                bullet.damage
            };

            sparks.push((bullet.body.pos, bullet.body.color));
            if critical {
                crits.push(bullet.body.pos);
            }
            if apply_damage(enemy, damage) {
                wrecks.push(Wreck::of(enemy));
            }

            if !bullet.behavior.pierces() {
                bullet.kill();
                break;
            }
        }
    }

    for (pos, color) in sparks {
        effects::hit_spark(state, pos, color);
    }
    for pos in crits {
        effects::shockwave(state, pos, 5.0, CRITICAL_COLOR);
    }
    for wreck in wrecks {
        destroy_enemy(state, wreck);
    }
}

enum Impact {
    Bullet,
    Ram(Vec2),
}

/// Enemy bullets and enemy bodies against the player.
/// Returns true if the player died this frame.
pub fn resolve_player_hits(state: &mut GameState) -> bool {
    if state.player().is_invulnerable() {
        return false;
    }

    let frame = state.frame;
    let registry = &mut state.registry;
    let player = &mut registry.player;
    let mut impacts = Vec::new();
    let mut wrecks = Vec::new();

    for bullet in registry.bullets.live_mut() {
        if player.is_invulnerable() {
            break;
        }
        if bullet.owner != Owner::Enemy {
            continue;
        }
        let reach = PLAYER_HITBOX + bullet.body.size.x / 2.0;
        if bullet.body.pos.distance(player.pos()) < reach {
            bullet.kill();
            player.take_hit(ENEMY_BULLET_DAMAGE, frame);
            impacts.push(Impact::Bullet);
        }
    }

    for enemy in registry.enemies.live_mut() {
        if player.is_invulnerable() {
            break;
        }
        let reach = (enemy.body.size.x + player.body.size.x) / 2.5;
        if enemy.body.pos.distance(player.pos()) < reach {
            player.take_hit(RAM_DAMAGE_TO_PLAYER, frame);
            impacts.push(Impact::Ram((enemy.body.pos + player.pos()) / 2.0));
            if apply_damage(enemy, RAM_DAMAGE_TO_ENEMY) {
                wrecks.push(Wreck::of(enemy));
            }
        }
    }

    let player_pos = state.player().pos();
    let player_color = state.player().body.color;
    for impact in impacts {
        match impact {
            Impact::Bullet => {
                state.shake(10.0);
                effects::explosion(state, player_pos, 10, player_color);
            }
            Impact::Ram(at) => {
                state.shake(15.0);
                effects::explosion(state, at, 20, WHITE);
            }
        }
        state.play(SoundCue::Explode);
        let hp = state.player().hp;
        state.emit(GameEvent::PlayerHit { hp });
    }

    // Decided before wrecks resolve: a boss kill must not heal a dead pilot
    let died = !state.player().is_alive();
    for wreck in wrecks {
        destroy_enemy(state, wreck);
    }

    if !died {
        return false;
    }
    state.phase = GamePhase::GameOver;
    state.play(SoundCue::Explode);
    state.emit(GameEvent::GameOver { score: state.score });
    log::info!("Game over at level {} with {} points", state.level, state.score);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy;
    use crate::sim::registry::EntityId;
    use crate::sim::state::{Bullet, BulletBehavior, EnemyKind, PowerUpKind, WeaponType};
    use std::f32::consts::FRAC_PI_2;

    fn state() -> GameState {
        GameState::new_match(31, WeaponType::Vulcan)
    }

    fn player_bullet(
        state: &mut GameState,
        pos: Vec2,
        damage: f32,
        behavior: BulletBehavior,
    ) -> EntityId {
        state.registry.spawn_bullet(|id| {
            Bullet::new(id, Owner::Player, pos, -FRAC_PI_2, 12.0, damage, behavior)
                .with_look(Vec2::new(16.0, 26.0), 0xf87171)
        })
    }

    fn enemy_bullet(state: &mut GameState, pos: Vec2) -> EntityId {
        state.registry.spawn_bullet(|id| {
            Bullet::new(
                id,
                Owner::Enemy,
                pos,
                FRAC_PI_2,
                4.0,
                ENEMY_BULLET_DAMAGE,
                BulletBehavior::Normal,
            )
        })
    }

    fn fighter(state: &mut GameState, pos: Vec2, hp: f32) -> EntityId {
        let id = enemy::spawn_regular(state, EnemyKind::Fighter, pos);
        if let Some(e) = state.registry.enemies.get_mut(id) {
            e.hp = hp;
            e.max_hp = hp;
        }
        id
    }

    fn exposed(state: &mut GameState) {
        state.player_mut().invulnerable_timer = 0;
    }

    #[test]
    fn test_aabb_overlap() {
        let size = Vec2::splat(10.0);
        assert!(aabb_overlap(Vec2::ZERO, size, Vec2::new(9.0, 9.0), size));
        assert!(!aabb_overlap(Vec2::ZERO, size, Vec2::new(10.0, 0.0), size));
        // Boxes, not circles: corners count
        assert!(aabb_overlap(Vec2::ZERO, size, Vec2::new(9.5, -9.5), size));
    }

    #[test]
    fn test_partial_damage_keeps_enemy() {
        let mut state = state();
        let target = fighter(&mut state, Vec2::new(300.0, 300.0), 25.0);
        let shot = player_bullet(&mut state, Vec2::new(300.0, 300.0), 12.0, BulletBehavior::Normal);

        resolve_player_fire(&mut state);
        let enemy = state.registry.enemies.get(target).expect("enemy");
        assert_eq!(enemy.hp, 13.0);
        assert!(!enemy.is_dead());
        assert!(state.registry.bullets.get(shot).is_some_and(|b| b.is_dead()));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_lethal_hit_runs_death_sequence() {
        let mut state = state();
        let target = fighter(&mut state, Vec2::new(300.0, 300.0), 25.0);
        player_bullet(&mut state, Vec2::new(300.0, 300.0), 30.0, BulletBehavior::Normal);

        resolve_player_fire(&mut state);
        assert!(state.registry.enemies.get(target).is_some_and(|e| e.is_dead()));
        assert_eq!(state.score, 100);
        assert!(state.registry.particles.len() > 15);
        assert!(state.drain_events().contains(&GameEvent::Sound(SoundCue::Explode)));

        state.registry.compact();
        assert!(state.registry.enemies.get(target).is_none());
    }

    #[test]
    fn test_death_side_effects_fire_once() {
        let mut state = state();
        fighter(&mut state, Vec2::new(300.0, 300.0), 25.0);
        for _ in 0..5 {
            player_bullet(&mut state, Vec2::new(300.0, 300.0), 30.0, BulletBehavior::Normal);
        }
        resolve_player_fire(&mut state);
        assert_eq!(state.score, 100);
        // Later bullets find the enemy already flagged and fly on
        assert_eq!(state.registry.bullets.live_count(), 4);
    }

    #[test]
    fn test_normal_bullet_hits_one_enemy() {
        let mut state = state();
        let a = fighter(&mut state, Vec2::new(300.0, 300.0), 100.0);
        let b = fighter(&mut state, Vec2::new(305.0, 300.0), 100.0);
        player_bullet(&mut state, Vec2::new(302.0, 300.0), 10.0, BulletBehavior::Normal);
        resolve_player_fire(&mut state);
        let hp = |id| state.registry.enemies.get(id).map(|e| e.hp).unwrap_or_default();
        assert_eq!(hp(a) + hp(b), 190.0);
    }

    #[test]
    fn test_beam_pierces_every_overlapping_enemy() {
        let mut state = state();
        let a = fighter(&mut state, Vec2::new(300.0, 300.0), 100.0);
        let b = fighter(&mut state, Vec2::new(305.0, 300.0), 100.0);
        let beam = player_bullet(&mut state, Vec2::new(302.0, 300.0), 10.0, BulletBehavior::Beam);
        resolve_player_fire(&mut state);
        resolve_player_fire(&mut state);
        for id in [a, b] {
            assert_eq!(state.registry.enemies.get(id).map(|e| e.hp), Some(80.0));
        }
        assert!(state.registry.bullets.get(beam).is_some_and(|b| !b.is_dead()));
    }

    #[test]
    fn test_mine_is_spent_on_first_hit() {
        let mut state = state();
        fighter(&mut state, Vec2::new(300.0, 300.0), 100.0);
        let mine = player_bullet(&mut state, Vec2::new(300.0, 300.0), 10.0, BulletBehavior::Mine);
        resolve_player_fire(&mut state);
        assert!(state.registry.bullets.get(mine).is_some_and(|b| b.is_dead()));
    }

    #[test]
    fn test_boss_weak_point_triples_damage() {
        let mut state = state();
        let boss = enemy::spawn_boss(&mut state);
        let center = state.registry.enemies.get(boss).map(|e| e.body.pos).expect("boss");

        player_bullet(&mut state, center, 12.0, BulletBehavior::Normal);
        resolve_player_fire(&mut state);
        let hp = state.registry.enemies.get(boss).map(|e| e.hp).expect("boss");
        assert_eq!(hp, 3000.0 - 36.0);
        assert!(state.registry.particles.iter().any(|p| p.body.color == CRITICAL_COLOR));

        player_bullet(&mut state, center + Vec2::new(50.0, 0.0), 12.0, BulletBehavior::Normal);
        resolve_player_fire(&mut state);
        let hp = state.registry.enemies.get(boss).map(|e| e.hp).expect("boss");
        assert_eq!(hp, 3000.0 - 48.0);
    }

    #[test]
    fn test_boss_defeat_advances_level() {
        let mut state = state();
        state.score = 2500;
        state.player_mut().hp = 30.0;
        let boss = enemy::spawn_boss(&mut state);
        let center = state.registry.enemies.get(boss).map(|e| e.body.pos).expect("boss");
        if let Some(b) = state.registry.enemies.get_mut(boss) {
            b.hp = 1.0;
        }
        for x in [50.0, 150.0, 250.0] {
            enemy_bullet(&mut state, Vec2::new(x, 500.0));
        }
        let stray =
            player_bullet(&mut state, Vec2::new(550.0, 600.0), 12.0, BulletBehavior::Normal);
        player_bullet(&mut state, center + Vec2::new(40.0, 0.0), 12.0, BulletBehavior::Normal);

        resolve_player_fire(&mut state);
        state.registry.compact();

        assert_eq!(state.level, 2);
        assert!(!state.boss_active);
        assert_eq!(state.score, 2500 + 5000);
        assert_eq!(state.next_boss_threshold, 7500 + 2 * BOSS_SCORE_THRESHOLD);
        assert_eq!(state.level_transition_timer, LEVEL_TRANSITION_FRAMES);
        assert_eq!(state.player().hp, 80.0);
        assert!(state.registry.bullets.iter().all(|b| b.owner == Owner::Player));
        assert!(state.registry.bullets.get(stray).is_some());
        assert!(state.registry.enemies.is_empty());

        let kinds: Vec<PowerUpKind> = state.registry.power_ups.iter().map(|p| p.kind).collect();
        assert_eq!(kinds.iter().filter(|k| k.weapon().is_some()).count(), 1);
        assert_eq!(kinds.iter().filter(|k| k.is_score()).count(), BOSS_BONUS_PICKUPS);
        assert!(state.drain_events().contains(&GameEvent::BossDefeated { level: 1 }));
    }

    #[test]
    fn test_invulnerability_blocks_damage() {
        let mut state = state();
        let pos = state.player().pos();
        enemy_bullet(&mut state, pos);
        fighter(&mut state, pos, 25.0);
        assert!(!resolve_player_hits(&mut state));
        assert_eq!(state.player().hp, PLAYER_MAX_HP);
        assert_eq!(state.registry.bullets.live_count(), 1);
    }

    #[test]
    fn test_enemy_bullet_hit() {
        let mut state = state();
        exposed(&mut state);
        state.frame = 42;
        let pos = state.player().pos();
        let shot = enemy_bullet(&mut state, pos + Vec2::new(8.0, 0.0));

        resolve_player_hits(&mut state);
        let player = state.player();
        assert_eq!(player.hp, PLAYER_MAX_HP - ENEMY_BULLET_DAMAGE);
        assert_eq!(player.invulnerable_timer, HIT_GRACE_FRAMES);
        assert_eq!(player.last_hit_frame, 42);
        assert!(state.registry.bullets.get(shot).is_some_and(|b| b.is_dead()));
        assert!(state.camera_shake >= 10.0);
        assert!(state.drain_events().contains(&GameEvent::PlayerHit { hp: 85.0 }));
    }

    #[test]
    fn test_hitbox_is_small() {
        let mut state = state();
        exposed(&mut state);
        let pos = state.player().pos();
        // Inside the sprite but outside the hitbox
        enemy_bullet(&mut state, pos + Vec2::new(20.0, 0.0));
        resolve_player_hits(&mut state);
        assert_eq!(state.player().hp, PLAYER_MAX_HP);
    }

    #[test]
    fn test_grace_window_absorbs_same_frame_hits() {
        let mut state = state();
        exposed(&mut state);
        let pos = state.player().pos();
        enemy_bullet(&mut state, pos);
        enemy_bullet(&mut state, pos);
        resolve_player_hits(&mut state);
        assert_eq!(state.player().hp, PLAYER_MAX_HP - ENEMY_BULLET_DAMAGE);
        assert_eq!(state.registry.bullets.live_count(), 1);
    }

    #[test]
    fn test_ram_damages_both() {
        let mut state = state();
        exposed(&mut state);
        let pos = state.player().pos();
        let rammer = fighter(&mut state, pos + Vec2::new(10.0, 0.0), 100.0);
        resolve_player_hits(&mut state);
        assert_eq!(state.player().hp, PLAYER_MAX_HP - RAM_DAMAGE_TO_PLAYER);
        let enemy = state.registry.enemies.get(rammer).expect("enemy");
        assert_eq!(enemy.hp, 100.0 - RAM_DAMAGE_TO_ENEMY);
    }

    #[test]
    fn test_lethal_hit_ends_match() {
        let mut state = state();
        exposed(&mut state);
        state.player_mut().hp = 10.0;
        state.score = 1234;
        let pos = state.player().pos();
        enemy_bullet(&mut state, pos);
        assert!(resolve_player_hits(&mut state));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.player().hp, 0.0);
        assert!(state.drain_events().contains(&GameEvent::GameOver { score: 1234 }));
    }

    #[test]
    fn test_fatal_ram_on_dying_boss_still_ends_match() {
        let mut state = state();
        exposed(&mut state);
        state.player_mut().hp = 20.0;
        let boss = enemy::spawn_boss(&mut state);
        let pos = state.player().pos();
        if let Some(e) = state.registry.enemies.get_mut(boss) {
            e.body.pos = pos;
            e.hp = 40.0;
        }

        assert!(resolve_player_hits(&mut state));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.player().hp, 0.0);
        // The boss still dies and pays out
        assert_eq!(state.level, 2);
        assert!(!state.boss_active);
    }
}
