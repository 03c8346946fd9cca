//! Player weapon patterns
//!
//! Firing is driven by an explicit countdown rather than global frame
//! parity. A volley is described as a list of [`Shot`]s relative to the
//! ship's muzzle, then turned into bullets in one pass.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

use super::homing::MINE_SPEED;
use super::state::{Bullet, BulletBehavior, GameState, Owner, SoundCue, WeaponType};
use crate::consts::*;

const UP: f32 = -FRAC_PI_2;
const DOWN: f32 = FRAC_PI_2;

/// Muzzle offset from the ship's centre
const MUZZLE: Vec2 = Vec2::new(0.0, -20.0);

/// Player firing clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponClock {
    /// Frames until the next volley
    pub cooldown: u32,
    /// Volleys fired this match
    pub volleys: u32,
}

impl WeaponClock {
    pub fn new(weapon: WeaponType) -> Self {
        Self {
            cooldown: fire_interval(weapon, false),
            volleys: 0,
        }
    }
}

/// Frames between volleys
pub fn fire_interval(weapon: WeaponType, hyper: bool) -> u32 {
    match (weapon, hyper) {
        (WeaponType::Vulcan | WeaponType::Laser, false) => 4,
        (WeaponType::Vulcan | WeaponType::Laser, true) => 2,
        (WeaponType::Plasma, false) => 8,
        (WeaponType::Plasma, true) => 4,
    }
}

/// Per-weapon base damage
pub fn base_damage(weapon: WeaponType) -> f32 {
    match weapon {
        WeaponType::Vulcan => 12.0,
        WeaponType::Laser => 7.0,
        WeaponType::Plasma => 16.0,
    }
}

/// Collision box and tint of a player bullet
fn bullet_look(weapon: WeaponType, behavior: BulletBehavior) -> (Vec2, u32) {
    if behavior == BulletBehavior::Mine {
        return (Vec2::splat(20.0), 0xf0abfc);
    }
    match weapon {
        WeaponType::Vulcan => (Vec2::new(16.0, 26.0), 0xf87171),
        WeaponType::Laser => (Vec2::new(14.0, 45.0), 0x60a5fa),
        WeaponType::Plasma => (Vec2::splat(18.0), 0xc084fc),
    }
}

/// Audio cue for one volley
pub fn fire_cue(weapon: WeaponType) -> SoundCue {
    match weapon {
        WeaponType::Laser => SoundCue::Laser,
        WeaponType::Vulcan | WeaponType::Plasma => SoundCue::Shoot,
    }
}

/// One bullet of a volley, relative to the muzzle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub offset: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub behavior: BulletBehavior,
    pub damage_scale: f32,
}

impl Shot {
    fn new(x: f32, y: f32, angle: f32, speed: f32) -> Self {
        Self {
            offset: Vec2::new(x, y),
            angle,
            speed,
            behavior: BulletBehavior::Normal,
            damage_scale: 1.0,
        }
    }

    fn behavior(mut self, behavior: BulletBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    fn scale(mut self, damage_scale: f32) -> Self {
        self.damage_scale = damage_scale;
        self
    }
}

/// Push a left/right mirrored pair: `x` and `spread` are the right-hand values
fn pair(
    shots: &mut Vec<Shot>,
    x: f32,
    y: f32,
    base: f32,
    spread: f32,
    make: impl Fn(Shot) -> Shot,
) {
    shots.push(make(Shot::new(-x, y, base - spread, 0.0)));
    shots.push(make(Shot::new(x, y, base + spread, 0.0)));
}

/// Bullets making up volley number `volley` (1-based)
pub fn volley(weapon: WeaponType, level: u32, variant: u32, volley: u32) -> Vec<Shot> {
    let level = level.clamp(1, MAX_WEAPON_LEVEL);
    // Repeated same-type pickups fan the side streams out a little
    let spread = 1.0 + variant as f32 * 0.04;
    let mut shots = Vec::with_capacity(24);

    match weapon {
        WeaponType::Vulcan => {
            let s = BULLET_SPEED_PLAYER;
            let speed = |shot: Shot| Shot { speed: s, ..shot };
            let missile = |shot: Shot| Shot { speed: s * 0.8, ..shot }
                .behavior(BulletBehavior::Homing)
                .scale(0.5);
            let missiles_now = level >= 7 || volley % 2 == 0;

            pair(&mut shots, 8.0, 0.0, UP, 0.0, speed);
            if level >= 2 {
                pair(&mut shots, 18.0, 5.0, UP, 0.1 * spread, speed);
            }
            if level >= 3 {
                pair(&mut shots, 28.0, 10.0, UP, 0.25 * spread, speed);
                if missiles_now {
                    pair(&mut shots, 30.0, 20.0, UP, 0.5, missile);
                }
            }
            if level >= 4 {
                pair(&mut shots, 35.0, 15.0, UP, 0.4 * spread, speed);
                if missiles_now {
                    pair(&mut shots, 40.0, 20.0, UP, 0.8, missile);
                }
            }
            if level >= 5 {
                // Rear guard
                pair(&mut shots, 12.0, 30.0, DOWN, -0.2, |shot| {
                    Shot { speed: s * 0.8, ..shot }.scale(0.6)
                });
            }
            let burst_every = if level >= 8 { 2 } else { 4 };
            if level >= 6 && volley % burst_every == 0 {
                let phase = variant as f32 * 0.2;
                for i in 0..8 {
                    let angle = TAU / 8.0 * i as f32 + phase;
                    shots.push(Shot::new(0.0, 0.0, angle, s * 0.7).scale(0.4));
                }
            }
        }
        WeaponType::Laser => {
            let s = BULLET_SPEED_PLAYER * 2.0;
            let beam = |scale: f32| {
                move |shot: Shot| Shot { speed: s, ..shot }
                    .behavior(BulletBehavior::Beam)
                    .scale(scale)
            };
            let main_scale = if level >= 7 { 1.5 } else { 1.0 };

            shots.push(beam(main_scale)(Shot::new(0.0, -10.0, UP, 0.0)));
            if level >= 2 {
                pair(&mut shots, 14.0, 10.0, UP, 0.0, beam(0.7));
            }
            if level >= 3 {
                pair(&mut shots, 20.0, 15.0, UP, 0.15 * spread, beam(0.4));
            }
            if level >= 4 {
                pair(&mut shots, 30.0, 20.0, UP, 0.3 * spread, beam(0.4));
            }
            if level >= 5 {
                pair(&mut shots, 40.0, 10.0, UP, 0.0, beam(0.5));
            }
            if level >= 6 {
                pair(&mut shots, 36.0, 25.0, UP, 0.45 * spread, beam(0.35));
            }
            if level >= 8 {
                pair(&mut shots, 10.0, 30.0, DOWN, 0.0, beam(0.3));
            }
        }
        WeaponType::Plasma => {
            let s = BULLET_SPEED_PLAYER * 1.1;
            let orb = |shot: Shot| Shot { speed: s, ..shot }.behavior(BulletBehavior::Homing);
            let penetrator = |shot: Shot| Shot { speed: s * 1.5, ..shot }.scale(1.2);
            let mine = |shot: Shot| {
                Shot { speed: MINE_SPEED, ..shot }
                    .behavior(BulletBehavior::Mine)
                    .scale(1.5)
            };

            pair(&mut shots, 10.0, 0.0, UP, 0.2 * spread, orb);
            if level >= 2 {
                pair(&mut shots, 25.0, 10.0, UP, 0.6 * spread, orb);
            }
            if level >= 3 {
                pair(&mut shots, 35.0, 15.0, UP, 1.0 * spread, orb);
                shots.push(penetrator(Shot::new(0.0, 0.0, UP, 0.0)));
            }
            if level >= 4 {
                pair(&mut shots, 45.0, 20.0, UP, 1.2, orb);
                pair(&mut shots, 8.0, 5.0, UP, 0.0, penetrator);
            }
            if level >= 5 {
                pair(&mut shots, 20.0, 10.0, UP, 0.9, mine);
            }
            if level >= 6 {
                shots.push(orb(Shot::new(0.0, -5.0, UP, 0.0)).scale(2.0));
            }
            if level >= 7 {
                pair(&mut shots, 55.0, 20.0, UP, 1.4, orb);
            }
            if level >= 8 {
                pair(&mut shots, 50.0, 20.0, UP, 1.5, mine);
            }
        }
    }

    shots
}

/// Advance the firing clock and emit a volley when it elapses.
/// Returns the number of bullets spawned.
pub fn fire(state: &mut GameState) -> usize {
    let player = state.player();
    let weapon = player.weapon;
    let level = player.weapon_level;
    let variant = player.weapon_variant;
    let hyper = player.hyper_active();
    let muzzle = player.pos() + MUZZLE;

    let clock = &mut state.weapon_clock;
    // A weapon switch or hyper mode can shorten the interval mid-countdown
    clock.cooldown = clock.cooldown.min(fire_interval(weapon, hyper));
    clock.cooldown = clock.cooldown.saturating_sub(1);
    if clock.cooldown > 0 {
        return 0;
    }
    clock.cooldown = fire_interval(weapon, hyper);
    clock.volleys += 1;
    let volley_index = clock.volleys;

    let bonus = if hyper { HYPER_DAMAGE_BONUS } else { 1.0 };
    let shots = volley(weapon, level, variant, volley_index);
    for shot in &shots {
        let damage = (base_damage(weapon) * shot.damage_scale * bonus).max(1.0);
        let (size, color) = bullet_look(weapon, shot.behavior);
        state.registry.spawn_bullet(|id| {
            Bullet::new(
                id,
                Owner::Player,
                muzzle + shot.offset,
                shot.angle,
                shot.speed,
                damage,
                shot.behavior,
            )
            .with_look(size, color)
        });
    }

    if !shots.is_empty() {
        state.play(fire_cue(weapon));
    }
    shots.len()
}
