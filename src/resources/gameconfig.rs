//! Game configuration.
//!
//! Settings loaded from an INI configuration file. Every value has a safe
//! default so a missing file or key never prevents startup.
//!
//! # Configuration File Format
//!
//! ```ini
//! [render]
//! width = 320
//! height = 240
//!
//! [window]
//! target_fps = 60
//!
//! [stage]
//! initial = title
//! time_scale = 1.0
//!
//! [assets]
//! root = ./assets
//!
//! [debug]
//! hitboxes = false
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::error::{EngineError, EngineResult};

/// Default safe values for startup
const DEFAULT_RENDER_WIDTH: u32 = 320;
const DEFAULT_RENDER_HEIGHT: u32 = 240;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_INITIAL_STAGE: &str = "main";
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_ASSETS_ROOT: &str = "./assets";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Logical render width in pixels (the script-visible viewport).
    pub render_width: u32,
    /// Logical render height in pixels.
    pub render_height: u32,
    /// Frames per second of the run loop.
    pub target_fps: u32,
    /// Stage activated at startup.
    pub initial_stage: String,
    /// Multiplier applied to every frame delta before it reaches a stage.
    pub time_scale: f32,
    /// Directory holding `atlases/`, `objects/`, `stages/`, `scripts/`.
    pub assets_root: PathBuf,
    /// Draw collision boxes on top of sprites.
    pub debug_hitboxes: bool,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
            render_height: DEFAULT_RENDER_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            initial_stage: DEFAULT_INITIAL_STAGE.to_owned(),
            time_scale: DEFAULT_TIME_SCALE,
            assets_root: PathBuf::from(DEFAULT_ASSETS_ROOT),
            debug_hitboxes: false,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values.
    pub fn load_from_file(&mut self) -> EngineResult<()> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(|e| {
            EngineError::Config(format!("{}: {}", self.config_path.display(), e))
        })?;

        // [render] section
        if let Some(width) = config.getuint("render", "width").ok().flatten() {
            self.render_width = width as u32;
        }
        if let Some(height) = config.getuint("render", "height").ok().flatten() {
            self.render_height = height as u32;
        }

        // [window] section
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = (fps as u32).max(1);
        }

        // [stage] section
        if let Some(initial) = config.get("stage", "initial") {
            self.initial_stage = initial;
        }
        if let Some(scale) = config.getfloat("stage", "time_scale").ok().flatten() {
            if scale >= 0.0 {
                self.time_scale = scale as f32;
            } else {
                warn!("ignoring negative time_scale {}", scale);
            }
        }

        // [assets] section
        if let Some(root) = config.get("assets", "root") {
            self.assets_root = PathBuf::from(root);
        }

        // [debug] section
        if let Some(hitboxes) = config.getbool("debug", "hitboxes").ok().flatten() {
            self.debug_hitboxes = hitboxes;
        }

        info!(
            "Loaded config: {}x{} render, fps={}, stage={}, time_scale={}, assets={}, hitboxes={}",
            self.render_width,
            self.render_height,
            self.target_fps,
            self.initial_stage,
            self.time_scale,
            self.assets_root.display(),
            self.debug_hitboxes
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> EngineResult<()> {
        let mut config = Ini::new();

        config.set("render", "width", Some(self.render_width.to_string()));
        config.set("render", "height", Some(self.render_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("stage", "initial", Some(self.initial_stage.clone()));
        config.set("stage", "time_scale", Some(self.time_scale.to_string()));
        config.set(
            "assets",
            "root",
            Some(self.assets_root.display().to_string()),
        );
        config.set("debug", "hitboxes", Some(self.debug_hitboxes.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| EngineError::io(&self.config_path, e))?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }

    /// Seconds per frame at the configured target rate.
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}
