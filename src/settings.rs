//! Game settings and preferences
//!
//! Stored as JSON. Missing fields take their defaults and out-of-range
//! values are clamped, so a hand-edited file never aborts a run.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::HUD_SYNC_INTERVAL;
use crate::sim::WeaponType;
use crate::sim::state::MAX_PARTICLES;

/// Failure to read or parse a settings file
#[derive(Debug)]
pub enum SettingsError {
    /// The file could not be read
    Io(std::io::Error),
    /// The contents were not valid settings JSON
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "could not read settings: {e}"),
            SettingsError::Parse(e) => write!(f, "invalid settings JSON: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Match ===
    /// Index of the weapon each match starts with (0 Vulcan, 1 Laser, 2 Plasma)
    pub starting_weapon: u32,
    /// Fixed RNG seed; a fresh one is drawn per match when absent
    pub seed: Option<u64>,

    // === HUD ===
    /// Frames between HUD snapshots
    pub hud_sync_interval: u32,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    // === Visual Effects ===
    /// Screen shake on explosions/impacts
    pub screen_shake: bool,
    /// Cap on spark and smoke particles
    pub max_particles: usize,

    // === Accessibility ===
    /// Reduced motion (dampens shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_weapon: 0,
            seed: None,

            hud_sync_interval: HUD_SYNC_INTERVAL,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,

            screen_shake: true,
            max_particles: MAX_PARTICLES,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Parse settings from JSON and clamp them into range
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.clamped())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `path`, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Pull every field into its valid range
    pub fn clamped(mut self) -> Self {
        if self.starting_weapon as usize >= WeaponType::ALL.len() {
            log::warn!(
                "Unknown starting weapon {}, using {}",
                self.starting_weapon,
                WeaponType::default().as_str()
            );
            self.starting_weapon = WeaponType::default().index();
        }
        self.hud_sync_interval = self.hud_sync_interval.max(1);
        self.master_volume = unit(self.master_volume);
        self.sfx_volume = unit(self.sfx_volume);
        self.music_volume = unit(self.music_volume);
        self
    }

    pub fn starting_weapon(&self) -> WeaponType {
        WeaponType::from_index(self.starting_weapon)
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Factor applied to the camera shake handed to the renderer
    pub fn shake_scale(&self) -> f32 {
        match (self.screen_shake, self.reduced_motion) {
            (false, _) => 0.0,
            (true, true) => 0.25,
            (true, false) => 1.0,
        }
    }
}

fn unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
