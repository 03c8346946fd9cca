//! Match driver
//!
//! Owns the simulation, the audio subsystem and the settings. Each display
//! tick runs exactly one Update, dispatches the events it produced, then
//! hands a read-only view to the renderer.

use serde::{Deserialize, Serialize};

use crate::audio::AudioManager;
use crate::render::{FrameView, Renderer};
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, HudSnapshot, TickInput, WeaponType, tick};

/// Seconds of music per display tick
const FRAME_SECONDS: f64 = 1.0 / 60.0;

/// End-of-match result handed to leaderboards and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub score: u64,
    pub level: u32,
    pub frames: u64,
    pub weapon: WeaponType,
    pub weapon_level: u32,
}

pub struct Game {
    pub state: GameState,
    pub settings: Settings,
    pub audio: AudioManager,
    /// Latest HUD snapshot published by the simulation
    hud: Option<HudSnapshot>,
    last_phase: GamePhase,
}

impl Game {
    /// A game sitting on the menu, with audio disabled
    pub fn new(settings: Settings) -> Self {
        Self::with_audio(settings, AudioManager::silent())
    }

    pub fn with_audio(settings: Settings, mut audio: AudioManager) -> Self {
        let settings = settings.clamped();
        audio.apply_settings(&settings);
        let seed = settings.seed.unwrap_or(0);
        let mut state = GameState::new(seed, settings.starting_weapon());
        state.hud_sync_interval = settings.hud_sync_interval;
        state.max_particles = settings.max_particles;
        Self {
            last_phase: state.phase,
            state,
            settings,
            audio,
            hud: None,
        }
    }

    /// MENU/GAME_OVER -> PLAYING with every core value reset
    pub fn start_match(&mut self) {
        let seed = self.settings.seed.unwrap_or_else(rand::random);
        self.state.starting_weapon = self.settings.starting_weapon();
        self.state.hud_sync_interval = self.settings.hud_sync_interval;
        self.state.max_particles = self.settings.max_particles;
        self.state.start_match(seed);
        self.hud = Some(self.state.hud_snapshot());
        self.sync_phase();
    }

    /// Start over from a finished (or abandoned) match
    pub fn restart(&mut self) {
        log::info!("Restarting match (final score {})", self.state.score);
        self.start_match();
    }

    pub fn to_menu(&mut self) {
        self.state.return_to_menu();
        self.sync_phase();
    }

    /// Run one display tick: Update, event dispatch, Render
    pub fn frame(&mut self, input: &TickInput, renderer: &mut dyn Renderer) {
        tick(&mut self.state, input);
        self.dispatch_events();
        self.sync_phase();
        self.audio.update(FRAME_SECONDS);
        renderer.render(&FrameView::new(&self.state, &self.settings));
    }

    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::Sound(cue) => self.audio.play(cue),
                GameEvent::HudSync(snapshot) => self.hud = Some(snapshot),
                GameEvent::PlayerHit { hp } => log::debug!("Player hit, {:.0} hp left", hp),
                other => log::trace!("{:?}", other),
            }
        }
    }

    fn sync_phase(&mut self) {
        let phase = self.state.phase;
        if phase != self.last_phase {
            log::debug!("Phase {:?} -> {:?}", self.last_phase, phase);
            self.last_phase = phase;
        }
        self.audio.sync_phase(phase);
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }

    pub fn hud(&self) -> Option<&HudSnapshot> {
        self.hud.as_ref()
    }

    pub fn final_score(&self) -> u64 {
        self.state.score
    }

    pub fn summary(&self) -> MatchSummary {
        let player = self.state.player();
        MatchSummary {
            score: self.state.score,
            level: self.state.level,
            frames: self.state.frame,
            weapon: player.weapon,
            weapon_level: player.weapon_level,
        }
    }
}
