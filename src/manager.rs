//! Stage manager.
//!
//! Owns the Lua runtime and the assets shared by every stage, knows which
//! stages exist (`stages/*.lua`) and switches between them. Stages are built
//! the first time they are activated and kept around, so re-entering one
//! resumes it where it was left.
//!
//! Scripts switch stages with `engine.set_stage(name)`; the switch happens
//! once the current tick has finished.

use std::path::Path;
use std::rc::Rc;

use log::{error, info, warn};
use rustc_hash::FxHashMap;

use crate::compositor::Compositor;
use crate::error::{EngineError, EngineResult};
use crate::resources::atlasregistry::AtlasRegistry;
use crate::resources::gameconfig::GameConfig;
use crate::resources::lua_runtime::LuaRuntime;
use crate::resources::screensize::ScreenSize;
use crate::resources::soundregistry::SoundRegistry;
use crate::stage::{Stage, StageOptions};

pub struct Manager {
    runtime: Rc<LuaRuntime>,
    atlases: AtlasRegistry,
    sounds: SoundRegistry,
    options: StageOptions,
    available: Vec<String>,
    stages: FxHashMap<String, Stage>,
    active: Option<String>,
}

/// Stage names found in `dir`, sorted.
fn list_stages(dir: &Path) -> EngineResult<Vec<String>> {
    if !dir.is_dir() {
        warn!("no stage directory at {}", dir.display());
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))? {
        let path = entry.map_err(|e| EngineError::io(dir, e))?.path();
        if path.extension().is_some_and(|ext| ext == "lua")
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            names.push(stem.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

impl Manager {
    /// Loads atlases, runs `scripts/main.lua` when present and lists the
    /// available stages. No stage is active until [`set`](Self::set).
    pub fn new(config: &GameConfig) -> EngineResult<Self> {
        let root = config.assets_root.as_path();
        let screen = ScreenSize {
            w: config.render_width as i32,
            h: config.render_height as i32,
        };
        let runtime = Rc::new(LuaRuntime::new(root, screen)?);

        let atlases = AtlasRegistry::load_dir(&root.join("atlases"))?;
        info!("loaded {} atlases", atlases.len());

        let main = root.join("scripts").join("main.lua");
        if main.is_file() {
            info!("running {}", main.display());
            runtime.run_script(&main.to_string_lossy())?;
        }

        let available = list_stages(&root.join("stages"))?;
        info!("stages: {:?}", available);

        Ok(Self {
            runtime,
            atlases,
            sounds: SoundRegistry::new(root.join("sounds")),
            options: StageOptions {
                screen,
                debug_hitboxes: config.debug_hitboxes,
                time_scale: config.time_scale,
            },
            available,
            stages: FxHashMap::default(),
            active: None,
        })
    }

    pub fn runtime(&self) -> &LuaRuntime {
        &self.runtime
    }

    pub fn stage_names(&self) -> &[String] {
        &self.available
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Stage> {
        self.active.as_ref().and_then(|name| self.stages.get(name))
    }

    /// A constructed stage, active or not.
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    /// Makes `name` the active stage.
    ///
    /// The current stage's `on_leave` completes before the next one is
    /// built (on first use) and entered. Activating the active stage is a
    /// no-op.
    pub fn set(&mut self, name: &str) -> EngineResult<()> {
        if self.active.as_deref() == Some(name) {
            return Ok(());
        }
        if !self.available.iter().any(|s| s == name) {
            return Err(EngineError::UnknownStage(name.to_owned()));
        }

        if let Some(current) = self.active.take()
            && let Some(stage) = self.stages.get_mut(&current)
        {
            stage.on_leave()?;
        }

        if !self.stages.contains_key(name) {
            let stage = Stage::new(
                name,
                self.runtime.clone(),
                self.atlases.clone(),
                &self.sounds,
                self.options,
            )?;
            self.stages.insert(name.to_owned(), stage);
        }

        if let Some(stage) = self.stages.get_mut(name) {
            stage.on_enter()?;
        }
        self.active = Some(name.to_owned());
        Ok(())
    }

    /// Runs one tick of the active stage, then applies any switch requested
    /// by `engine.set_stage`.
    pub fn update(&mut self, delta: f32) -> EngineResult<()> {
        if let Some(stage) = self.active.as_ref().and_then(|n| self.stages.get_mut(n)) {
            stage.on_loop(delta)?;
        }
        if let Some(next) = self.runtime.take_stage_request() {
            self.set(&next)?;
        }
        Ok(())
    }

    /// Presents the active stage and flushes the compositor.
    pub fn draw(&self, compositor: &mut dyn Compositor) {
        if let Some(stage) = self.active() {
            stage.on_draw(compositor);
        }
        compositor.draw();
    }

    /// Destroys a constructed stage that is not active. Returns whether a
    /// stage was dropped.
    pub fn discard(&mut self, name: &str) -> bool {
        if self.active.as_deref() == Some(name) {
            warn!("refusing to discard active stage '{}'", name);
            return false;
        }
        self.stages.remove(name).is_some()
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        if let Some(stage) = self.active.take().and_then(|n| self.stages.get_mut(&n))
            && let Err(e) = stage.on_leave()
        {
            error!("leaving stage '{}' failed: {}", stage.name(), e);
        }
        self.stages.clear();
    }
}
