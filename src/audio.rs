//! Audio subsystem
//!
//! The simulation only emits [`SoundCue`]s. This module turns them into
//! voice descriptions for a pluggable backend and runs the background music
//! sequencer, whose lifetime follows the match phase. A failing backend is
//! switched off after its first error; gameplay never notices.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::settings::Settings;
use crate::sim::{GamePhase, SoundCue};

/// Oscillator shape of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One enveloped oscillator: a frequency sweep under a decaying gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    pub freq_start: f32,
    pub freq_end: f32,
    pub gain: f32,
    /// Seconds
    pub duration: f32,
}

impl Voice {
    const fn new(
        waveform: Waveform,
        freq_start: f32,
        freq_end: f32,
        gain: f32,
        duration: f32,
    ) -> Self {
        Self {
            waveform,
            freq_start,
            freq_end,
            gain,
            duration,
        }
    }
}

const SHOOT: &[Voice] = &[Voice::new(Waveform::Square, 800.0, 300.0, 0.05, 0.1)];
const LASER: &[Voice] = &[Voice::new(Waveform::Sawtooth, 1200.0, 600.0, 0.05, 0.15)];
const EXPLODE: &[Voice] = &[
    Voice::new(Waveform::Sawtooth, 100.0, 10.0, 0.2, 0.4),
    Voice::new(Waveform::Square, 50.0, 20.0, 0.2, 0.3),
];
const POWER_UP: &[Voice] = &[Voice::new(Waveform::Sine, 400.0, 1000.0, 0.1, 0.2)];
const BOMB: &[Voice] = &[Voice::new(Waveform::Triangle, 150.0, 10.0, 0.5, 1.5)];
/// Two-note chime (B5 then E6)
const COIN: &[Voice] = &[
    Voice::new(Waveform::Square, 988.0, 988.0, 0.06, 0.08),
    Voice::new(Waveform::Square, 1319.0, 1319.0, 0.06, 0.2),
];
const INVINCIBLE: &[Voice] = &[Voice::new(Waveform::Sine, 300.0, 1500.0, 0.12, 0.6)];

/// Voices that make up a sound effect
pub fn cue_voices(cue: SoundCue) -> &'static [Voice] {
    match cue {
        SoundCue::Shoot => SHOOT,
        SoundCue::Laser => LASER,
        SoundCue::Explode => EXPLODE,
        SoundCue::PowerUp => POWER_UP,
        SoundCue::Bomb => BOMB,
        SoundCue::Coin => COIN,
        SoundCue::Invincible => INVINCIBLE,
    }
}

/// Failure reported by an audio backend
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No output device or context
    Unavailable(String),
    /// A voice could not be started
    Playback(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Unavailable(why) => write!(f, "audio unavailable: {why}"),
            AudioError::Playback(why) => write!(f, "audio playback failed: {why}"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Something that can make noise
pub trait AudioBackend {
    /// Start the voices of a sound effect at `volume` (0.0 - 1.0)
    fn play_cue(
        &mut self,
        cue: SoundCue,
        voices: &[Voice],
        volume: f32,
    ) -> Result<(), AudioError>;

    /// Start one music note `at` seconds into the song
    fn play_note(&mut self, note: Note, at: f64, volume: f32) -> Result<(), AudioError>;
}

/// Backend for headless runs: every sound becomes a trace log line
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play_cue(
        &mut self,
        cue: SoundCue,
        voices: &[Voice],
        volume: f32,
    ) -> Result<(), AudioError> {
        log::trace!("cue {:?} ({} voices) at {:.2}", cue, voices.len(), volume);
        Ok(())
    }

    fn play_note(&mut self, note: Note, at: f64, volume: f32) -> Result<(), AudioError> {
        log::trace!("note {:?} at {:.3}s vol {:.2}", note, at, volume);
        Ok(())
    }
}

// === Music ===

/// Song tempo in beats per minute
pub const TEMPO_BPM: f64 = 128.0;
const STEPS_PER_BAR: u32 = 16;
/// C2
const BASS_ROOT: f32 = 65.41;
/// Minor-triad arpeggio over the root (C, Eb, G, C)
const BASS_INTERVALS: [f32; 4] = [1.0, 1.2, 1.5, 2.0];

/// A single drum hit or bass note
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Note {
    Kick,
    HiHat { freq: f32 },
    Bass { freq: f32 },
}

/// Seconds per sixteenth note
pub fn step_duration() -> f64 {
    60.0 / TEMPO_BPM / 4.0
}

/// Sixteenth-note step sequencer (kick, hi-hat, bass arpeggio)
#[derive(Debug, Clone)]
pub struct MusicSequencer {
    playing: bool,
    step: u32,
    /// Song clock, seconds since start
    clock: f64,
    next_note_time: f64,
    rng: Pcg32,
}

impl Default for MusicSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicSequencer {
    pub fn new() -> Self {
        Self {
            playing: false,
            step: 0,
            clock: 0.0,
            next_note_time: 0.0,
            rng: Pcg32::seed_from_u64(128),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start from the top of the bar; no-op if already playing
    pub fn start(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.step = 0;
        self.next_note_time = self.clock;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Notes sounding on `step` of the bar
    pub fn notes_for_step(&mut self, step: u32) -> Vec<Note> {
        let mut notes = Vec::with_capacity(3);
        if step % 4 == 0 {
            notes.push(Note::Kick);
        }
        if step % 4 == 2 {
            let freq = if self.rng.random::<bool>() { 1200.0 } else { 800.0 };
            notes.push(Note::HiHat { freq });
        }
        let degree = ((step / 2) % BASS_INTERVALS.len() as u32) as usize;
        notes.push(Note::Bass {
            freq: BASS_ROOT * BASS_INTERVALS[degree],
        });
        notes
    }

    /// Advance the song clock by `dt` seconds, returning every note that
    /// came due as `(time, note)`
    pub fn advance(&mut self, dt: f64) -> Vec<(f64, Note)> {
        self.clock += dt;
        let mut due = Vec::new();
        if !self.playing {
            return due;
        }
        while self.next_note_time <= self.clock {
            let at = self.next_note_time;
            for note in self.notes_for_step(self.step) {
                due.push((at, note));
            }
            self.next_note_time += step_duration();
            self.step = (self.step + 1) % STEPS_PER_BAR;
        }
        due
    }
}

// === Manager ===

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    music: MusicSequencer,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend: Some(backend),
            music: MusicSequencer::new(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }

    /// Manager with no output at all
    pub fn silent() -> Self {
        let mut manager = Self::new(Box::new(LogBackend));
        manager.backend = None;
        manager
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_music_volume(settings.music_volume);
        self.set_muted(settings.muted);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// False once the backend failed (or there never was one)
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn music_playing(&self) -> bool {
        self.music.is_playing()
    }

    fn effective_volume(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * channel
        }
    }

    fn disable(&mut self, err: &AudioError) {
        log::warn!("{err} - audio disabled");
        self.backend = None;
    }

    /// Play a sound effect
    pub fn play(&mut self, cue: SoundCue) {
        let vol = self.effective_volume(self.sfx_volume);
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        if let Err(e) = backend.play_cue(cue, cue_voices(cue), vol) {
            self.disable(&e);
        }
    }

    /// Music runs only while a match is being played
    pub fn sync_phase(&mut self, phase: GamePhase) {
        match phase {
            GamePhase::Playing => self.music.start(),
            GamePhase::Menu | GamePhase::Paused | GamePhase::GameOver => self.music.stop(),
        }
    }

    /// Advance the music by `dt` seconds and hand due notes to the backend
    pub fn update(&mut self, dt: f64) {
        let notes = self.music.advance(dt);
        let vol = self.effective_volume(self.music_volume);
        if vol <= 0.0 {
            return;
        }
        for (at, note) in notes {
            let Some(backend) = self.backend.as_mut() else {
                return;
            };
            if let Err(e) = backend.play_note(note, at, vol) {
                self.disable(&e);
            }
        }
    }
}
