//! Target seeking for homing missiles and mines

use glam::Vec2;

use super::registry::Entity;
use super::state::{Bullet, BulletBehavior, Enemy};
use crate::consts::*;
use crate::{angle_of, from_angle};

/// Cruise speed of a drifting mine
pub const MINE_SPEED: f32 = 4.0;

/// Steering parameters for one behaviour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seeker {
    /// Targets further than this are ignored
    pub radius: f32,
    /// Fraction of the desired velocity blended in per frame
    pub turn_rate: f32,
    /// Speed of the desired velocity
    pub speed: f32,
}

impl Seeker {
    pub fn for_behavior(behavior: BulletBehavior) -> Option<Self> {
        match behavior {
            BulletBehavior::Homing => Some(Self {
                radius: 400.0,
                turn_rate: 0.15,
                speed: BULLET_SPEED_PLAYER,
            }),
            BulletBehavior::Mine => Some(Self {
                radius: 500.0,
                turn_rate: 0.04,
                speed: MINE_SPEED,
            }),
            BulletBehavior::Normal | BulletBehavior::Beam => None,
        }
    }
}

/// Nearest live, on-screen enemy within `radius` of `from`
pub fn nearest_target<'a>(
    from: Vec2,
    radius: f32,
    enemies: impl IntoIterator<Item = &'a Enemy>,
) -> Option<&'a Enemy> {
    enemies
        .into_iter()
        .filter(|e| !e.is_dead() && e.body.pos.y > 0.0 && e.body.pos.y < FIELD_HEIGHT)
        .map(|e| (e, e.body.pos.distance_squared(from)))
        .filter(|(_, d2)| *d2 < radius * radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

/// Bend a steering bullet toward its target. Without a target it flies on.
pub fn steer<'a>(bullet: &mut Bullet, enemies: impl IntoIterator<Item = &'a Enemy>) {
    let Some(seeker) = Seeker::for_behavior(bullet.behavior) else {
        return;
    };
    let Some(target) = nearest_target(bullet.body.pos, seeker.radius, enemies) else {
        return;
    };

    let desired = from_angle(angle_of(target.body.pos - bullet.body.pos), seeker.speed);
    bullet.body.vel = bullet.body.vel.lerp(desired, seeker.turn_rate);
    if bullet.body.vel.length_squared() > f32::EPSILON {
        bullet.angle = angle_of(bullet.body.vel);
    }
}
