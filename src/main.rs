//! Stagehand runner.
//!
//! Loads `config.ini`, builds a [`Manager`] over the assets directory and
//! drives the initial stage:
//!
//! - with `--frames N`, for exactly N ticks of the configured frame delta
//!   (deterministic, useful for smoke tests of a game's scripts);
//! - otherwise in real time until the process is stopped.
//!
//! Draw commands go to an in-memory compositor; a platform renderer plugs in
//! by implementing [`Compositor`](stagehand::compositor::Compositor).
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --assets ./assets --stage title --frames 600
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{info, warn};

use stagehand::compositor::RecordingCompositor;
use stagehand::error::EngineResult;
use stagehand::manager::Manager;
use stagehand::resources::gameconfig::GameConfig;

/// Upper bound for one frame's delta, so a stall never turns into a burst
/// of catch-up physics steps.
const MAX_DELTA: f32 = 0.25;

/// Stagehand 2D stage runtime
#[derive(Parser)]
#[command(version, about = "Runs a scripted 2D game from an assets directory.")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Assets directory, overriding `[assets] root`.
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Initial stage, overriding `[stage] initial`.
    #[arg(long, value_name = "NAME")]
    stage: Option<String>,

    /// Run this many fixed-delta frames and exit.
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Draw collision boxes.
    #[arg(long)]
    debug: bool,
}

fn load_config(cli: &Cli) -> EngineResult<GameConfig> {
    let mut config = GameConfig::with_path(&cli.config);
    if config.config_path.is_file() {
        config.load_from_file()?;
    } else {
        warn!("{} not found, using defaults", config.config_path.display());
    }
    if let Some(assets) = &cli.assets {
        config.assets_root = assets.clone();
    }
    if let Some(stage) = &cli.stage {
        config.initial_stage = stage.clone();
    }
    config.debug_hitboxes |= cli.debug;
    Ok(config)
}

fn run(cli: Cli) -> EngineResult<()> {
    let config = load_config(&cli)?;
    let mut manager = Manager::new(&config)?;
    let mut compositor = RecordingCompositor::new();
    manager.set(&config.initial_stage)?;

    let frame = config.frame_delta();
    match cli.frames {
        Some(frames) => {
            for _ in 0..frames {
                manager.update(frame)?;
                manager.draw(&mut compositor);
            }
        }
        None => {
            let target = Duration::from_secs_f32(frame);
            let mut last = Instant::now();
            loop {
                let now = Instant::now();
                let delta = (now - last).as_secs_f32().min(MAX_DELTA);
                last = now;
                manager.update(delta)?;
                manager.draw(&mut compositor);
                if let Some(rest) = target.checked_sub(now.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        }
    }

    info!("ran {} frames", compositor.frames());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
