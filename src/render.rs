//! Render contract
//!
//! Renderers receive a [`FrameView`] borrowed from the simulation after each
//! update. The view hands out shared references only, so a renderer cannot
//! mutate the match.

use glam::Vec2;

use crate::settings::Settings;
use crate::sim::effects::Backdrop;
use crate::sim::{Bullet, Enemy, GamePhase, GameState, Particle, Player, PowerUp};

/// Everything a renderer may look at for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub phase: GamePhase,
    pub frame: u64,
    pub player: &'a Player,
    pub bullets: &'a [Bullet],
    pub enemies: &'a [Enemy],
    pub power_ups: &'a [PowerUp],
    pub particles: &'a [Particle],
    pub backdrop: &'a Backdrop,
    /// Shake magnitude after the player's motion preferences
    pub camera_shake: f32,
    /// Frames left in the post-boss pause (0 outside one)
    pub level_transition: u32,
    pub level: u32,
    pub score: u64,
}

impl<'a> FrameView<'a> {
    pub fn new(state: &'a GameState, settings: &Settings) -> Self {
        let registry = &state.registry;
        Self {
            phase: state.phase,
            frame: state.frame,
            player: &registry.player,
            bullets: registry.bullets.as_slice(),
            enemies: registry.enemies.as_slice(),
            power_ups: registry.power_ups.as_slice(),
            particles: registry.particles.as_slice(),
            backdrop: &state.backdrop,
            camera_shake: state.camera_shake * settings.shake_scale(),
            level_transition: state.level_transition_timer,
            level: state.level,
            score: state.score,
        }
    }

    /// Random-looking camera offset for this frame, bounded by `camera_shake`
    ///
    /// Derived from the frame number so repeated renders of one frame agree.
    pub fn shake_offset(&self) -> Vec2 {
        if self.camera_shake <= 0.0 {
            return Vec2::ZERO;
        }
        let t = self.frame as f32;
        let x = (t * 12.9898).sin();
        let y = (t * 78.233).cos();
        Vec2::new(x, y) * self.camera_shake
    }

    /// Particles that have not faded out completely
    pub fn visible_particles(&self) -> impl Iterator<Item = &'a Particle> + use<'a> {
        self.particles.iter().filter(|p| p.alpha() > 0.0)
    }

    /// Entities a renderer would draw this frame
    pub fn drawable_count(&self) -> usize {
        1 + self.bullets.len()
            + self.enemies.len()
            + self.power_ups.len()
            + self.visible_particles().count()
    }
}

/// Produces a visual frame from a [`FrameView`]
pub trait Renderer {
    fn render(&mut self, view: &FrameView<'_>);
}

/// Headless renderer: records what it was shown and logs at debug level
#[derive(Debug, Default)]
pub struct SummaryRenderer {
    pub frames: u64,
    pub last_drawables: usize,
    pub peak_drawables: usize,
}

impl Renderer for SummaryRenderer {
    fn render(&mut self, view: &FrameView<'_>) {
        self.frames += 1;
        self.last_drawables = view.drawable_count();
        self.peak_drawables = self.peak_drawables.max(self.last_drawables);
        if view.frame % 600 == 0 && view.phase == GamePhase::Playing {
            log::debug!(
                "frame {}: {} drawables, {} enemies, level {}, score {}",
                view.frame,
                self.last_drawables,
                view.enemies.len(),
                view.level,
                view.score
            );
        }
    }
}
