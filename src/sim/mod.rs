//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One fixed logical step per tick, no time deltas
//! - Seeded RNG only (separate gameplay and cosmetic streams)
//! - Stable iteration order (insertion order == entity ID order)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod effects;
pub mod enemy;
pub mod homing;
pub mod powerup;
pub mod registry;
pub mod state;
pub mod tick;
pub mod weapon;

pub use registry::{Entity, EntityId, Pool, Registry};
pub use state::{
    Bullet, BulletBehavior, Enemy, EnemyKind, GameEvent, GamePhase, GameState, HudSnapshot,
    Particle, ParticleKind, Player, PowerUp, PowerUpKind, SoundCue, WeaponType,
};
pub use tick::{TickInput, tick, trigger_bomb};
