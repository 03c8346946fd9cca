//! Thunder Strike - a vertically-scrolling shoot-'em-up core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, weapons, enemies, collisions)
//! - `game`: Match driver pairing one Update with one Render per display tick
//! - `render`: Read-only render contract
//! - `audio`: Sound cue dispatch and background music sequencing
//! - `settings`: Player-facing configuration

pub mod audio;
pub mod game;
pub mod render;
pub mod settings;
pub mod sim;

pub use game::{Game, MatchSummary};
pub use settings::{Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Play-field dimensions
    pub const FIELD_WIDTH: f32 = 600.0;
    pub const FIELD_HEIGHT: f32 = 800.0;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const PLAYER_WIDTH: f32 = 60.0;
    pub const PLAYER_HEIGHT: f32 = 50.0;
    /// Collision radius against enemy bullets (much smaller than the sprite)
    pub const PLAYER_HITBOX: f32 = 6.0;
    pub const PLAYER_MAX_HP: f32 = 100.0;
    pub const PLAYER_START_BOMBS: u32 = 2;
    pub const MAX_BOMBS: u32 = 9;
    /// Drag deltas are amplified so a short swipe crosses the field
    pub const DRAG_SENSITIVITY: f32 = 1.5;

    pub const BULLET_SPEED_PLAYER: f32 = 12.0;
    pub const BULLET_SPEED_ENEMY: f32 = 4.0;

    pub const MAX_WEAPON_LEVEL: u32 = 8;
    pub const HYPER_MODE_FRAMES: u32 = 600;
    pub const HYPER_DAMAGE_BONUS: f32 = 1.2;

    pub const SPAWN_INVULNERABILITY_FRAMES: u32 = 240;
    pub const HIT_GRACE_FRAMES: u32 = 60;
    pub const INVINCIBILITY_PICKUP_FRAMES: u32 = 600;

    pub const REGEN_DELAY_FRAMES: u64 = 480;
    pub const REGEN_INTERVAL_FRAMES: u32 = 30;
    pub const REGEN_AMOUNT: f32 = 1.0;

    pub const ENEMY_BULLET_DAMAGE: f32 = 15.0;
    pub const RAM_DAMAGE_TO_PLAYER: f32 = 30.0;
    pub const RAM_DAMAGE_TO_ENEMY: f32 = 50.0;
    pub const BOMB_DAMAGE: f32 = 200.0;

    pub const BOSS_SCORE_THRESHOLD: u64 = 2000;
    pub const LEVEL_TRANSITION_FRAMES: u32 = 180;
    pub const BOSS_HEAL: f32 = 50.0;
    pub const BOSS_BONUS_PICKUPS: usize = 4;

    /// Presentation sync cadence when settings don't override it
    pub const HUD_SYNC_INTERVAL: u32 = 5;
}

/// Heading of a vector in radians (screen space, +y is down)
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Vector of the given length pointing along `angle`
#[inline]
pub fn from_angle(angle: f32, speed: f32) -> Vec2 {
    Vec2::new(angle.cos() * speed, angle.sin() * speed)
}

/// True if `pos` lies inside the rectangle grown by `margin` on every side
#[inline]
pub fn within_field(pos: Vec2, margin_x: f32, margin_top: f32, margin_bottom: f32) -> bool {
    pos.x >= -margin_x
        && pos.x <= consts::FIELD_WIDTH + margin_x
        && pos.y >= -margin_top
        && pos.y <= consts::FIELD_HEIGHT + margin_bottom
}
