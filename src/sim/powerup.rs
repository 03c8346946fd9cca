//! Power-up drops, drift and pickup effects

use glam::Vec2;
use rand::Rng;

use super::registry::{Entity, EntityId};
use super::state::{GameState, POWER_UP_SIZE, PowerUp, PowerUpKind, SoundCue};
use crate::consts::*;

/// Chance that a destroyed regular enemy drops anything
pub const DROP_CHANCE: f32 = 0.35;

const FALL_SPEED: f32 = 2.0;
const MAGNET_RANGE: f32 = 100.0;
const MAGNET_PULL: f32 = 0.05;
const PICKUP_RANGE: f32 = POWER_UP_SIZE + PLAYER_WIDTH / 2.0;

const HEALTH_AMOUNT: f32 = 15.0;
const PICKUP_SCORE: u64 = 100;
const INVINCIBILITY_SCORE: u64 = 500;
/// Chance a same-type pickup raises the level by two instead of one
const DOUBLE_LEVEL_CHANCE: f32 = 0.3;
/// Number of distinct spread phases
const WEAPON_VARIANTS: u32 = 4;

/// Weighted lookup over a uniform roll in [0, 1)
#[derive(Debug, Clone, Copy)]
pub struct DropTable {
    entries: &'static [(PowerUpKind, f32)],
}

/// Regular enemy loot
pub const ENEMY_DROPS: DropTable = DropTable {
    entries: &[
        (PowerUpKind::PRed, 0.15),
        (PowerUpKind::PBlue, 0.15),
        (PowerUpKind::PPurple, 0.12),
        (PowerUpKind::PUpgrade, 0.18),
        (PowerUpKind::Health, 0.12),
        (PowerUpKind::Bomb, 0.08),
        (PowerUpKind::ScoreGold, 0.06),
        (PowerUpKind::ScoreSilver, 0.10),
        (PowerUpKind::Invincibility, 0.04),
    ],
};

impl DropTable {
    pub fn pick(&self, r: f32) -> PowerUpKind {
        let mut acc = 0.0;
        for &(kind, weight) in self.entries {
            acc += weight;
            if r < acc {
                return kind;
            }
        }
        // Rounding slack lands on the last entry
        self.entries
            .last()
            .map(|&(kind, _)| kind)
            .unwrap_or(PowerUpKind::PUpgrade)
    }

    pub fn total_weight(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w).sum()
    }
}

/// Drop a pickup that falls with a slight sideways drift
pub fn spawn_power_up(state: &mut GameState, kind: PowerUpKind, pos: Vec2) -> EntityId {
    let vel = Vec2::new((state.frame as f32).sin(), FALL_SPEED);
    state
        .registry
        .spawn_power_up(|id| PowerUp::new(id, kind, pos, vel))
}

/// Roll the regular-enemy drop table
pub fn try_drop(state: &mut GameState, pos: Vec2) -> Option<EntityId> {
    if state.rng.random::<f32>() >= DROP_CHANCE {
        return None;
    }
    let kind = ENEMY_DROPS.pick(state.rng.random::<f32>());
    Some(spawn_power_up(state, kind, pos))
}

/// Weapon pickup a boss of `level` leaves behind
pub fn boss_weapon_drop(level: u32) -> PowerUpKind {
    const CYCLE: [PowerUpKind; 3] = [PowerUpKind::PRed, PowerUpKind::PBlue, PowerUpKind::PPurple];
    CYCLE[(level.saturating_sub(1) % 3) as usize]
}

/// Guaranteed boss loot: one weapon pickup plus the bonus score items
pub fn drop_boss_loot(state: &mut GameState, pos: Vec2, level: u32) {
    spawn_power_up(state, boss_weapon_drop(level), pos);
    for i in 0..BOSS_BONUS_PICKUPS {
        let kind = if i % 2 == 0 {
            PowerUpKind::ScoreGold
        } else {
            PowerUpKind::ScoreSilver
        };
        let offset = Vec2::new((i as f32 - 1.5) * 40.0, -20.0 - (i % 2) as f32 * 20.0);
        spawn_power_up(state, kind, pos + offset);
    }
}

/// Drift, magnetise and collect pickups
pub fn update_power_ups(state: &mut GameState) {
    let player_pos = state.player().pos();
    let mut collected = Vec::new();

    for power_up in state.registry.power_ups.live_mut() {
        let body = &mut power_up.body;
        body.integrate();
        let half = body.half_extents().x;
        body.pos.x = body.pos.x.clamp(half, FIELD_WIDTH - half);

        if body.pos.distance(player_pos) < MAGNET_RANGE {
            body.pos = body.pos.lerp(player_pos, MAGNET_PULL);
        }

        if body.pos.distance(player_pos) < PICKUP_RANGE {
            power_up.kill();
            collected.push(power_up.kind);
        } else if body.pos.y > FIELD_HEIGHT + 50.0 {
            power_up.kill();
        }
    }

    for kind in collected {
        apply_pickup(state, kind);
    }
}

/// Apply one collected pickup to the player and score
pub fn apply_pickup(state: &mut GameState, kind: PowerUpKind) {
    match kind {
        PowerUpKind::ScoreGold | PowerUpKind::ScoreSilver => {
            let award: u64 = if kind == PowerUpKind::ScoreGold {
                state.rng.random_range(500..=1000)
            } else {
                state.rng.random_range(100..=300)
            };
            state.score += award;
            state.play(SoundCue::Coin);
            return;
        }
        PowerUpKind::Invincibility => {
            let player = state.player_mut();
            player.invulnerable_timer = player.invulnerable_timer.max(INVINCIBILITY_PICKUP_FRAMES);
            state.score += INVINCIBILITY_SCORE;
            state.play(SoundCue::Invincible);
            return;
        }
        PowerUpKind::Health => state.player_mut().heal(HEALTH_AMOUNT),
        PowerUpKind::Bomb => {
            let player = state.player_mut();
            player.bombs = (player.bombs + 1).min(MAX_BOMBS);
        }
        PowerUpKind::PUpgrade => {
            state.player_mut().raise_weapon_level(1);
        }
        PowerUpKind::PRed | PowerUpKind::PBlue | PowerUpKind::PPurple => {
            if let Some(weapon) = kind.weapon() {
                let steps = if state.rng.random::<f32>() < DOUBLE_LEVEL_CHANCE { 2 } else { 1 };
                let player = state.player_mut();
                if player.weapon != weapon {
                    log::debug!("Weapon switched to {}", weapon.as_str());
                    player.switch_weapon(weapon);
                } else if !player.raise_weapon_level(steps) {
                    player.hyper_mode_timer = HYPER_MODE_FRAMES;
                    player.weapon_variant = (player.weapon_variant + 1) % WEAPON_VARIANTS;
                    log::debug!("Hyper mode armed (variant {})", player.weapon_variant);
                }
            }
        }
    }
    state.score += PICKUP_SCORE;
    state.play(SoundCue::PowerUp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GameEvent, WeaponType};

    fn state() -> GameState {
        GameState::new_match(21, WeaponType::Vulcan)
    }

    #[test]
    fn test_drop_table_boundaries() {
        assert!((ENEMY_DROPS.total_weight() - 1.0).abs() < 1e-5);
        assert_eq!(ENEMY_DROPS.pick(0.0), PowerUpKind::PRed);
        assert_eq!(ENEMY_DROPS.pick(0.149), PowerUpKind::PRed);
        assert_eq!(ENEMY_DROPS.pick(0.151), PowerUpKind::PBlue);
        assert_eq!(ENEMY_DROPS.pick(0.5), PowerUpKind::PUpgrade);
        assert_eq!(ENEMY_DROPS.pick(0.97), PowerUpKind::Invincibility);
        assert_eq!(ENEMY_DROPS.pick(1.0), PowerUpKind::Invincibility);
    }

    #[test]
    fn test_boss_weapon_drop_cycles() {
        assert_eq!(boss_weapon_drop(1), PowerUpKind::PRed);
        assert_eq!(boss_weapon_drop(2), PowerUpKind::PBlue);
        assert_eq!(boss_weapon_drop(3), PowerUpKind::PPurple);
        assert_eq!(boss_weapon_drop(4), PowerUpKind::PRed);
    }

    #[test]
    fn test_health_pickup() {
        let mut state = state();
        state.player_mut().hp = 50.0;
        let pos = state.player().pos();
        let id = spawn_power_up(&mut state, PowerUpKind::Health, pos);

        update_power_ups(&mut state);
        assert_eq!(state.player().hp, 65.0);
        assert_eq!(state.score, 100);
        assert!(state.registry.power_ups.get(id).is_some_and(|p| p.is_dead()));
        assert!(state
            .drain_events()
            .contains(&GameEvent::Sound(SoundCue::PowerUp)));
    }

    #[test]
    fn test_health_clamped_to_max() {
        let mut state = state();
        state.player_mut().hp = 95.0;
        apply_pickup(&mut state, PowerUpKind::Health);
        assert_eq!(state.player().hp, PLAYER_MAX_HP);
    }

    #[test]
    fn test_colored_pickup_switches_weapon() {
        let mut state = state();
        state.player_mut().weapon_level = 3;
        apply_pickup(&mut state, PowerUpKind::PBlue);
        assert_eq!(state.player().weapon, WeaponType::Laser);
        assert_eq!(state.player().weapon_level, 3);
    }

    #[test]
    fn test_same_color_raises_level() {
        let mut state = state();
        apply_pickup(&mut state, PowerUpKind::PRed);
        let level = state.player().weapon_level;
        assert!(level == 2 || level == 3);
    }

    #[test]
    fn test_over_cap_arms_hyper_mode() {
        let mut state = state();
        state.player_mut().weapon_level = MAX_WEAPON_LEVEL;
        apply_pickup(&mut state, PowerUpKind::PRed);
        let player = state.player();
        assert_eq!(player.weapon_level, MAX_WEAPON_LEVEL);
        assert_eq!(player.hyper_mode_timer, HYPER_MODE_FRAMES);
        assert_eq!(player.weapon_variant, 1);
    }

    #[test]
    fn test_score_pickups_award_range() {
        let mut state = state();
        apply_pickup(&mut state, PowerUpKind::ScoreGold);
        assert!((500..=1000).contains(&state.score));
        let before = state.score;
        apply_pickup(&mut state, PowerUpKind::ScoreSilver);
        assert!((100..=300).contains(&(state.score - before)));
    }

    #[test]
    fn test_invincibility_pickup() {
        let mut state = state();
        state.player_mut().invulnerable_timer = 0;
        apply_pickup(&mut state, PowerUpKind::Invincibility);
        assert_eq!(state.player().invulnerable_timer, INVINCIBILITY_PICKUP_FRAMES);
        assert_eq!(state.score, INVINCIBILITY_SCORE);
    }

    #[test]
    fn test_bombs_capped() {
        let mut state = state();
        state.player_mut().bombs = MAX_BOMBS;
        apply_pickup(&mut state, PowerUpKind::Bomb);
        assert_eq!(state.player().bombs, MAX_BOMBS);
    }

    #[test]
    fn test_magnet_pulls_nearby_pickup() {
        let mut state = state();
        let player = state.player().pos();
        let start = player + Vec2::new(70.0, -20.0);
        let id = spawn_power_up(&mut state, PowerUpKind::Bomb, start);
        update_power_ups(&mut state);
        let p = state.registry.power_ups.get(id).expect("pickup");
        assert!(p.body.pos.distance(player) < (start + p.body.vel).distance(player));
    }

    #[test]
    fn test_pickups_culled_below_field() {
        let mut state = state();
        let edge = Vec2::new(50.0, FIELD_HEIGHT + 49.0);
        let id = spawn_power_up(&mut state, PowerUpKind::Bomb, edge);
        update_power_ups(&mut state);
        assert!(state.registry.power_ups.get(id).is_some_and(|p| p.is_dead()));
        assert_eq!(state.player().bombs, PLAYER_START_BOMBS);
    }

    #[test]
    fn test_boss_loot_layout() {
        let mut state = state();
        drop_boss_loot(&mut state, Vec2::new(300.0, 150.0), 2);
        let kinds: Vec<_> = state.registry.power_ups.iter().map(|p| p.kind).collect();
        assert_eq!(kinds.len(), 1 + BOSS_BONUS_PICKUPS);
        assert_eq!(kinds.iter().filter(|k| k.weapon().is_some()).count(), 1);
        assert_eq!(kinds.iter().filter(|k| k.is_score()).count(), BOSS_BONUS_PICKUPS);
        assert!(kinds.contains(&PowerUpKind::PBlue));
    }
}
