//! Cosmetic effects: particles and the scrolling backdrop
//!
//! Nothing here feeds back into gameplay. All randomness comes from the
//! cosmetic RNG stream so effects never shift spawn or drop rolls.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::registry::Entity;
use super::state::{Body, GameState, Particle, ParticleKind};
use crate::consts::*;
use crate::from_angle;

/// Life lost per frame by every particle
pub const PARTICLE_DECAY: f32 = 0.03;
const SMOKE_COLOR: u32 = 0x555555;
const FLASH_COLOR: u32 = 0xffffff;

/// One parallax star
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    pub brightness: f32,
}

/// One drifting cloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
    pub alpha: f32,
}

/// Background layers, scrolled by the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backdrop {
    pub stars: Vec<Star>,
    pub clouds: Vec<Cloud>,
}

const STAR_COUNT: usize = 120;
const CLOUD_COUNT: usize = 15;

impl Backdrop {
    pub fn new(rng: &mut Pcg32) -> Self {
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                pos: Vec2::new(
                    rng.random::<f32>() * FIELD_WIDTH,
                    rng.random::<f32>() * FIELD_HEIGHT,
                ),
                size: rng.random::<f32>() * 1.5 + 0.5,
                speed: rng.random::<f32>() * 4.0 + 0.5,
                brightness: rng.random::<f32>(),
            })
            .collect();
        let clouds = (0..CLOUD_COUNT)
            .map(|_| Cloud {
                pos: Vec2::new(
                    rng.random::<f32>() * FIELD_WIDTH,
                    rng.random::<f32>() * FIELD_HEIGHT,
                ),
                size: Vec2::new(
                    rng.random::<f32>() * 100.0 + 50.0,
                    rng.random::<f32>() * 80.0 + 40.0,
                ),
                speed: rng.random::<f32>() * 2.0 + 5.0,
                alpha: rng.random::<f32>() * 0.1 + 0.05,
            })
            .collect();
        Self { stars, clouds }
    }

    /// Advance both layers, wrapping anything that leaves the bottom
    pub fn scroll(&mut self, star_mult: f32, cloud_mult: f32, rng: &mut Pcg32) {
        for star in &mut self.stars {
            star.pos.y += star.speed * star_mult;
            if star.pos.y > FIELD_HEIGHT {
                star.pos.y = 0.0;
                star.pos.x = rng.random::<f32>() * FIELD_WIDTH;
            }
        }
        for cloud in &mut self.clouds {
            cloud.pos.y += cloud.speed * cloud_mult;
            if cloud.pos.y > FIELD_HEIGHT + cloud.size.y {
                cloud.pos.y = -cloud.size.y;
                cloud.pos.x = rng.random::<f32>() * FIELD_WIDTH;
            }
        }
    }
}

/// How many more sparks fit under the particle cap
fn spark_budget(state: &GameState) -> usize {
    state
        .max_particles
        .saturating_sub(state.registry.particles.len())
}

fn push_spark(
    state: &mut GameState,
    pos: Vec2,
    speed: (f32, f32),
    life: (f32, f32),
    scale: (f32, f32),
    color: u32,
) {
    let rng = &mut state.fx_rng;
    let angle = rng.random::<f32>() * std::f32::consts::TAU;
    let vel = from_angle(angle, rng.random::<f32>() * speed.1 + speed.0);
    let life = rng.random::<f32>() * life.1 + life.0;
    let scale = rng.random::<f32>() * scale.1 + scale.0;
    state.registry.spawn_particle(|id| Particle {
        body: Body::new(id, pos, vel, Vec2::ZERO, color),
        life,
        max_life: 1.0,
        scale,
        kind: ParticleKind::Spark,
    });
}

/// Burst of smoke plus colored sparks
pub fn explosion(state: &mut GameState, pos: Vec2, count: usize, color: u32) {
    let smoke = (count / 2).min(spark_budget(state));
    for _ in 0..smoke {
        push_spark(state, pos, (0.5, 2.0), (0.5, 0.5), (2.0, 5.0), SMOKE_COLOR);
    }
    let sparks = count.min(spark_budget(state));
    for _ in 0..sparks {
        push_spark(state, pos, (2.0, 5.0), (0.3, 0.5), (2.0, 4.0), color);
    }
}

/// Single spark where a bullet connected
pub fn hit_spark(state: &mut GameState, pos: Vec2, color: u32) {
    if spark_budget(state) > 0 {
        push_spark(state, pos, (2.0, 5.0), (0.3, 0.5), (2.0, 4.0), color);
    }
}

/// Tumbling wreckage chunks (ignores the spark cap)
pub fn debris(state: &mut GameState, pos: Vec2, count: usize, color: u32) {
    for _ in 0..count {
        let rng = &mut state.fx_rng;
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let vel = from_angle(angle, rng.random::<f32>() * 3.0 + 1.0);
        let rotation = rng.random::<f32>() * std::f32::consts::TAU;
        let spin = (rng.random::<f32>() - 0.5) * 0.4;
        let scale = rng.random::<f32>() * 6.0 + 4.0;
        state.registry.spawn_particle(|id| Particle {
            body: Body::new(id, pos, vel, Vec2::ZERO, color),
            life: 1.0,
            max_life: 1.0,
            scale,
            kind: ParticleKind::Debris { rotation, spin },
        });
    }
}

/// Expanding ring
pub fn shockwave(state: &mut GameState, pos: Vec2, scale: f32, color: u32) {
    state.registry.spawn_particle(|id| Particle {
        body: Body::new(id, pos, Vec2::ZERO, Vec2::ZERO, color),
        life: 1.0,
        max_life: 1.0,
        scale,
        kind: ParticleKind::Shockwave,
    });
}

/// Full-field flash centred on the play-field
pub fn flash(state: &mut GameState) {
    let center = Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0);
    state.registry.spawn_particle(|id| Particle {
        body: Body::new(id, center, Vec2::ZERO, Vec2::ZERO, FLASH_COLOR),
        life: 1.0,
        max_life: 1.0,
        scale: 500.0,
        kind: ParticleKind::Flash,
    });
}

/// Move, fade and retire particles
pub fn update_particles(state: &mut GameState) {
    for particle in state.registry.particles.live_mut() {
        particle.life -= PARTICLE_DECAY;
        particle.body.integrate();
        match &mut particle.kind {
            ParticleKind::Debris { rotation, spin } => {
                *rotation += *spin;
                particle.body.vel *= 0.97;
            }
            ParticleKind::Shockwave => particle.scale *= 1.08,
            ParticleKind::Spark | ParticleKind::Flash => {}
        }
        if particle.life <= 0.0 {
            particle.kill();
        }
    }
}
