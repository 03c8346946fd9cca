//! Thunder Strike headless runner
//!
//! Plays one autopilot match and prints its summary as JSON.
//!
//! Usage: `thunder-strike [settings.json] [max-frames]`

use std::process::ExitCode;

use thunder_strike::audio::{AudioManager, LogBackend};
use thunder_strike::render::SummaryRenderer;
use thunder_strike::sim::TickInput;
use thunder_strike::{Game, Settings};

/// Ten minutes at 60 fps
const DEFAULT_MAX_FRAMES: u64 = 36_000;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    let max_frames = match args.next().map(|s| s.parse::<u64>()) {
        None => DEFAULT_MAX_FRAMES,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("invalid frame limit: {e}");
            return ExitCode::FAILURE;
        }
    };

    log::info!("Thunder Strike (headless) starting...");
    let mut game = Game::with_audio(settings, AudioManager::new(Box::new(LogBackend)));
    let mut renderer = SummaryRenderer::default();
    game.start_match();

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    while !game.is_over() && game.state.frame < max_frames {
        game.frame(&input, &mut renderer);
    }

    let summary = game.summary();
    log::info!(
        "Match finished after {} frames ({} rendered, peak {} drawables)",
        summary.frames,
        renderer.frames,
        renderer.peak_drawables
    );
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("could not encode summary: {e}");
            ExitCode::FAILURE
        }
    }
}
