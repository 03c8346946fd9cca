//! Fixed timestep simulation tick
//!
//! One call advances the match by exactly one logical frame. Subsystems run
//! in a fixed order: collisions see end-of-frame positions, and compaction
//! runs only after every pass that may inspect a flagged entity.

use glam::Vec2;

use super::collision::{self, Wreck};
use super::effects;
use super::enemy;
use super::homing;
use super::powerup;
use super::registry::Entity;
use super::state::{GameEvent, GamePhase, GameState, Owner, SoundCue};
use super::weapon;
use crate::consts::*;
use crate::within_field;

const BOMB_BLAST_COLOR: u32 = 0xf59e0b;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal axis, -1 (left) to 1 (right)
    pub move_x: f32,
    /// Vertical axis, -1 (up) to 1 (down)
    pub move_y: f32,
    /// Pointer drag since the previous tick
    pub drag: Option<Vec2>,
    /// Bomb trigger (edge, not held)
    pub bomb: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::debug!("Paused at frame {}", state.frame);
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::Menu | GamePhase::GameOver => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    let mut input = input.clone();
    if input.idle_mode {
        let auto = autopilot(state);
        input.move_x = auto.move_x;
        input.move_y = auto.move_y;
        input.drag = None;
        input.bomb = auto.bomb;
    }

    state.frame += 1;
    decay_timers(state);

    if state.in_level_transition() {
        state.level_transition_timer -= 1;
        state.backdrop.scroll(5.0, 2.0, &mut state.fx_rng);
        effects::update_particles(state);
        state.registry.compact();
        if !state.in_level_transition() {
            log::info!("Level {} started", state.level);
            state.emit(GameEvent::LevelStarted { level: state.level });
        }
        decay_shake(state);
        return;
    }

    state.backdrop.scroll(1.0, 1.0, &mut state.fx_rng);
    move_player(state, &input);
    if input.bomb && trigger_bomb(state) && state.in_level_transition() {
        // Bomb finished the boss: the transition starts now
        state.registry.compact();
        decay_shake(state);
        return;
    }
    weapon::fire(state);
    enemy::update_spawner(state);
    enemy::update_enemies(state);
    update_bullets(state);
    powerup::update_power_ups(state);
    effects::update_particles(state);
    collision::resolve_player_fire(state);
    collision::resolve_player_hits(state);
    state.registry.compact();

    let interval = u64::from(state.hud_sync_interval.max(1));
    if state.frame % interval == 0 {
        let snapshot = state.hud_snapshot();
        state.emit(GameEvent::HudSync(snapshot));
    }
    decay_shake(state);
}

/// Invulnerability, hyper mode and regeneration countdowns
pub fn decay_timers(state: &mut GameState) {
    let frame = state.frame;
    let player = &mut state.registry.player;
    player.invulnerable_timer = player.invulnerable_timer.saturating_sub(1);
    player.hyper_mode_timer = player.hyper_mode_timer.saturating_sub(1);

    let rested = frame.saturating_sub(player.last_hit_frame) > REGEN_DELAY_FRAMES;
    if rested && player.is_alive() && player.hp < player.max_hp {
        state.regen_cooldown = state.regen_cooldown.saturating_sub(1);
        if state.regen_cooldown == 0 {
            state.regen_cooldown = REGEN_INTERVAL_FRAMES;
            player.heal(REGEN_AMOUNT);
        }
    } else {
        state.regen_cooldown = REGEN_INTERVAL_FRAMES;
    }
}

fn decay_shake(state: &mut GameState) {
    state.camera_shake *= 0.9;
    if state.camera_shake < 0.5 {
        state.camera_shake = 0.0;
    }
}

fn move_player(state: &mut GameState, input: &TickInput) {
    let player = state.player_mut();
    let axes = Vec2::new(input.move_x.clamp(-1.0, 1.0), input.move_y.clamp(-1.0, 1.0));
    player.body.pos += axes * player.speed;
    if let Some(delta) = input.drag {
        player.body.pos += delta * DRAG_SENSITIVITY;
    }
    player.clamp_to_field();
}

/// Homing retarget, integrate, then cull anything off the field
fn update_bullets(state: &mut GameState) {
    let registry = &mut state.registry;
    for bullet in registry.bullets.live_mut() {
        if bullet.is_player_owned() && bullet.behavior.steers() {
            homing::steer(bullet, registry.enemies.iter());
        }
        bullet.body.integrate();
        if !within_field(bullet.body.pos, 50.0, 100.0, 50.0) {
            bullet.kill();
        }
    }
}

/// Screen-clearing bomb. Returns false if no charge was available.
pub fn trigger_bomb(state: &mut GameState) -> bool {
    let player = state.player();
    if player.bombs == 0 || !player.is_alive() {
        return false;
    }
    state.player_mut().bombs -= 1;
    state.shake(25.0);
    state.play(SoundCue::Bomb);
    let cleared = state.clear_enemy_bullets();

    let mut blasts = Vec::new();
    let mut wrecks = Vec::new();
    for enemy in state.registry.enemies.live_mut() {
        blasts.push(enemy.body.pos);
        if collision::apply_damage(enemy, BOMB_DAMAGE) {
            wrecks.push(Wreck::of(enemy));
        }
    }
    for pos in &blasts {
        effects::explosion(state, *pos, 30, BOMB_BLAST_COLOR);
    }
    effects::flash(state);
    for wreck in wrecks {
        collision::destroy_enemy(state, wreck);
    }

    log::debug!(
        "Bomb: {} bullets cleared, {} enemies hit, {} left",
        cleared,
        blasts.len(),
        state.player().bombs
    );
    true
}

/// Demo-mode pilot: dodge nearby fire, grab pickups when safe, track enemies
pub fn autopilot(state: &GameState) -> TickInput {
    const DANGER_RADIUS: f32 = 120.0;
    const PICKUP_RADIUS: f32 = 300.0;
    const CRUISE_Y: f32 = FIELD_HEIGHT - 150.0;

    let me = state.player().pos();
    let mut push = Vec2::ZERO;
    let mut threats = 0;
    for bullet in state.registry.bullets.live() {
        if bullet.owner != Owner::Enemy {
            continue;
        }
        let away = me - bullet.body.pos;
        let dist = away.length();
        if dist < DANGER_RADIUS && dist > f32::EPSILON {
            push += away / (dist * dist);
            threats += 1;
        }
    }

    let heading = if push != Vec2::ZERO {
        push.normalize_or_zero()
    } else if let Some(pickup) = state
        .registry
        .power_ups
        .live()
        .map(|p| p.body.pos)
        .filter(|p| p.distance(me) < PICKUP_RADIUS)
        .min_by(|a, b| a.distance(me).total_cmp(&b.distance(me)))
    {
        (pickup - me) / 20.0
    } else {
        let target_x = state
            .registry
            .enemies
            .live()
            .filter(|e| e.body.pos.y > 0.0)
            .min_by(|a, b| a.body.pos.distance(me).total_cmp(&b.body.pos.distance(me)))
            .map_or(FIELD_WIDTH / 2.0, |e| e.body.pos.x);
        Vec2::new(target_x - me.x, CRUISE_Y - me.y) / 20.0
    };

    let player = state.player();
    let swarmed = threats >= 12 || (threats >= 4 && player.hp < player.max_hp * 0.3);
    TickInput {
        move_x: heading.x.clamp(-1.0, 1.0),
        move_y: heading.y.clamp(-1.0, 1.0),
        bomb: swarmed && player.bombs > 0,
        idle_mode: true,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Bullet, BulletBehavior, EnemyKind, ParticleKind, WeaponType};
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    fn playing(seed: u64) -> GameState {
        GameState::new_match(seed, WeaponType::Vulcan)
    }

    fn player_bullets(state: &GameState) -> Vec<&Bullet> {
        state
            .registry
            .bullets
            .live()
            .filter(|b| b.is_player_owned())
            .collect()
    }

    fn enemy_bullet(state: &mut GameState, pos: Vec2) {
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
        });
    }

    #[test]
    fn test_vulcan_first_volley() {
        let mut state = playing(1);
        let input = TickInput::default();
        for _ in 0..3 {
            tick(&mut state, &input);
            assert!(player_bullets(&state).is_empty());
        }
        tick(&mut state, &input);
        assert_eq!(state.frame % 4, 0);
        let bullets = player_bullets(&state);
        assert_eq!(bullets.len(), 2);
        for bullet in bullets {
            assert!((bullet.angle + FRAC_PI_2).abs() < 1e-6);
            assert!((bullet.body.vel.length() - BULLET_SPEED_PLAYER).abs() < 1e-4);
            assert!(bullet.body.vel.x.abs() < 1e-4);
        }
    }

    #[test]
    fn test_menu_does_not_simulate() {
        let mut state = GameState::new(1, WeaponType::Vulcan);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.frame, 0);
        assert!(state.registry.bullets.is_empty());
    }

    #[test]
    fn test_pause_toggle() {
        let mut state = playing(2);
        tick(&mut state, &TickInput::default());
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause);
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.frame, 1);

        tick(&mut state, &TickInput::default());
        assert_eq!(state.frame, 1);

        tick(&mut state, &pause);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.frame, 2);
    }

    #[test]
    fn test_game_over_freezes() {
        let mut state = playing(3);
        state.phase = GamePhase::GameOver;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.frame, 0);
    }

    #[test]
    fn test_keyboard_and_drag_movement_clamped() {
        let mut state = playing(4);
        let start = state.player().pos();
        tick(
            &mut state,
            &TickInput {
                move_x: 1.0,
                ..Default::default()
            },
        );
        assert_eq!(state.player().pos().x, start.x + PLAYER_SPEED);

        tick(
            &mut state,
            &TickInput {
                drag: Some(Vec2::new(-10.0, 0.0)),
                ..Default::default()
            },
        );
        assert_eq!(state.player().pos().x, start.x + PLAYER_SPEED - 15.0);

        tick(
            &mut state,
            &TickInput {
                drag: Some(Vec2::new(-5000.0, 5000.0)),
                ..Default::default()
            },
        );
        let pos = state.player().pos();
        assert_eq!(pos.x, PLAYER_WIDTH / 2.0);
        assert_eq!(pos.y, FIELD_HEIGHT - PLAYER_HEIGHT / 2.0);
    }

    #[test]
    fn test_bomb_clears_and_damages() {
        let mut state = playing(5);
        let fighter = enemy::spawn_regular(&mut state, EnemyKind::Tank, Vec2::new(100.0, 200.0));
        if let Some(e) = state.registry.enemies.get_mut(fighter) {
            e.hp = 500.0;
        }
        let boss = enemy::spawn_boss(&mut state);
        for x in [100.0, 200.0, 300.0] {
            enemy_bullet(&mut state, Vec2::new(x, 400.0));
        }

        assert!(trigger_bomb(&mut state));
        assert_eq!(state.player().bombs, 1);
        assert!(state
            .registry
            .bullets
            .live()
            .all(|b| b.owner != Owner::Enemy));
        assert_eq!(state.registry.enemies.get(fighter).map(|e| e.hp), Some(300.0));
        assert_eq!(state.registry.enemies.get(boss).map(|e| e.hp), Some(2800.0));
        let flashes = state
            .registry
            .particles
            .iter()
            .filter(|p| p.kind == ParticleKind::Flash)
            .count();
        assert_eq!(flashes, 1);
        assert!(state.drain_events().contains(&GameEvent::Sound(SoundCue::Bomb)));
    }

    #[test]
    fn test_bomb_kills_weak_enemies_once() {
        let mut state = playing(6);
        enemy::spawn_regular(&mut state, EnemyKind::Fighter, Vec2::new(100.0, 200.0));
        assert!(trigger_bomb(&mut state));
        assert_eq!(state.score, 100);
        assert_eq!(state.registry.enemies.live_count(), 0);
    }

    #[test]
    fn test_bomb_needs_charge() {
        let mut state = playing(7);
        state.player_mut().bombs = 0;
        assert!(!trigger_bomb(&mut state));
        assert!(state.registry.particles.is_empty());
    }

    #[test]
    fn test_bomb_through_input() {
        let mut state = playing(8);
        tick(
            &mut state,
            &TickInput {
                bomb: true,
                ..Default::default()
            },
        );
        assert_eq!(state.player().bombs, PLAYER_START_BOMBS - 1);
    }

    #[test]
    fn test_boss_bomb_kill_starts_transition_immediately() {
        let mut state = playing(8);
        let boss = enemy::spawn_boss(&mut state);
        if let Some(e) = state.registry.enemies.get_mut(boss) {
            e.hp = 150.0;
        }
        state.spawn_cooldown = 1;
        state.weapon_clock.cooldown = 1;

        let bomb = TickInput {
            bomb: true,
            ..Default::default()
        };
        tick(&mut state, &bomb);
        assert_eq!(state.level, 2);
        assert!(state.in_level_transition());
        assert_eq!(state.registry.enemies.live_count(), 0);
        assert!(state.registry.enemies.is_empty());
        assert!(player_bullets(&state).is_empty());
    }

    #[test]
    fn test_level_transition_gates_gameplay() {
        let mut state = playing(9);
        state.level = 2;
        state.level_transition_timer = 3;
        let star_y = state.backdrop.stars[0].pos.y;

        for _ in 0..3 {
            tick(&mut state, &TickInput::default());
        }
        assert!(state.registry.bullets.is_empty());
        assert!(state.registry.enemies.is_empty());
        assert_ne!(state.backdrop.stars[0].pos.y, star_y);
        assert!(state.drain_events().contains(&GameEvent::LevelStarted { level: 2 }));

        tick(&mut state, &TickInput::default());
        assert!(!state.in_level_transition());
    }

    #[test]
    fn test_regen_after_quiet_period() {
        let mut state = playing(10);
        state.player_mut().hp = 50.0;
        state.frame = 1000;
        for _ in 0..REGEN_INTERVAL_FRAMES {
            decay_timers(&mut state);
        }
        assert_eq!(state.player().hp, 50.0 + REGEN_AMOUNT);

        state.player_mut().last_hit_frame = 990;
        for _ in 0..REGEN_INTERVAL_FRAMES * 3 {
            decay_timers(&mut state);
        }
        assert_eq!(state.player().hp, 50.0 + REGEN_AMOUNT);
    }

    #[test]
    fn test_timers_never_underflow() {
        let mut state = playing(11);
        state.player_mut().invulnerable_timer = 1;
        state.player_mut().hyper_mode_timer = 1;
        decay_timers(&mut state);
        decay_timers(&mut state);
        assert_eq!(state.player().invulnerable_timer, 0);
        assert_eq!(state.player().hyper_mode_timer, 0);
    }

    #[test]
    fn test_hud_sync_cadence() {
        let mut state = playing(12);
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        let syncs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::HudSync(_)))
            .count();
        assert_eq!(syncs, 2);
    }

    #[test]
    fn test_shake_decays_to_zero() {
        let mut state = playing(13);
        state.shake(10.0);
        for _ in 0..40 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.camera_shake, 0.0);
    }

    #[test]
    fn test_bullets_culled_off_field() {
        let mut state = playing(14);
        enemy_bullet(&mut state, Vec2::new(300.0, FIELD_HEIGHT + 48.0));
        tick(&mut state, &TickInput::default());
        assert!(state.registry.bullets.is_empty());
    }

    #[test]
    fn test_autopilot_dodges() {
        let mut state = playing(15);
        let me = state.player().pos();
        enemy_bullet(&mut state, me + Vec2::new(-20.0, -5.0));
        let input = autopilot(&state);
        assert!(input.move_x > 0.0);
        assert!(!input.bomb);
    }

    #[test]
    fn test_determinism() {
        let mut a = playing(99_999);
        let mut b = playing(99_999);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..1200 {
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.frame, b.frame);
        assert_eq!(a.score, b.score);
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.registry.enemies.len(), b.registry.enemies.len());
        assert_eq!(a.registry.bullets.len(), b.registry.bullets.len());
        assert_eq!(a.player().pos(), b.player().pos());
        assert_eq!(a.player().hp, b.player().hp);
    }

    fn arb_input() -> impl Strategy<Value = TickInput> {
        let drag = prop::option::of((-30.0f32..30.0, -30.0f32..30.0));
        (-1.0f32..=1.0, -1.0f32..=1.0, any::<bool>(), drag)
            .prop_map(|(move_x, move_y, bomb, drag)| TickInput {
                move_x,
                move_y,
                drag: drag.map(|(x, y)| Vec2::new(x, y)),
                bomb,
                ..Default::default()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_player_invariants_hold(
            seed in any::<u64>(),
            inputs in prop::collection::vec(arb_input(), 1..400),
        ) {
            let mut state = playing(seed);
            for input in &inputs {
                tick(&mut state, input);
                let player = state.player();
                prop_assert!(player.hp >= 0.0 && player.hp <= player.max_hp);
                prop_assert!((1..=MAX_WEAPON_LEVEL).contains(&player.weapon_level));
                prop_assert!(player.bombs <= MAX_BOMBS);
                prop_assert!(!state.registry.has_pending_removals());
                prop_assert!(state.registry.enemies.iter().filter(|e| e.is_boss()).count() <= 1);
            }
        }

        #[test]
        fn prop_invulnerability_blocks_damage(
            offsets in prop::collection::vec((-8.0f32..8.0, -8.0f32..8.0), 1..20),
            timer in 1u32..600,
        ) {
            let mut state = playing(1);
            state.player_mut().invulnerable_timer = timer;
            let me = state.player().pos();
            for (x, y) in offsets {
                enemy_bullet(&mut state, me + Vec2::new(x, y));
                enemy::spawn_regular(&mut state, EnemyKind::Fighter, me + Vec2::new(y, x));
            }
            collision::resolve_player_hits(&mut state);
            prop_assert_eq!(state.player().hp, PLAYER_MAX_HP);
        }
    }
}
