//! Shared fixtures: throwaway asset trees and stage inspection helpers.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::rc::Rc;

use bevy_ecs::prelude::*;
use mlua::prelude::*;
use tempfile::TempDir;

use stagehand::components::identifiable::Identifiable;
use stagehand::error::EngineResult;
use stagehand::resources::atlasregistry::AtlasRegistry;
use stagehand::resources::gameconfig::GameConfig;
use stagehand::resources::lua_runtime::LuaRuntime;
use stagehand::resources::nametable::NameId;
use stagehand::resources::screensize::ScreenSize;
use stagehand::resources::soundregistry::SoundRegistry;
use stagehand::stage::{Stage, StageOptions};

pub const SCREEN: ScreenSize = ScreenSize { w: 320, h: 240 };

pub const EPSILON: f32 = 1e-4;

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// `items` atlas: sprites 0-3 are 16x16 with a full hitbox, sprite 4 has no
/// hitbox, sprite 5 is 16x16 with an 8x4 box at (2, 10).
const ITEMS_ATLAS: &str = r#"{
  "texture": "items.png",
  "sprites": [
    { "u0": 0.0,  "v0": 0, "u1": 0.125, "v1": 1, "w": 16, "h": 16, "hitbox": { "x": 0, "y": 0, "w": 16, "h": 16 } },
    { "u0": 0.125, "v0": 0, "u1": 0.25, "v1": 1, "w": 16, "h": 16, "hitbox": { "x": 0, "y": 0, "w": 16, "h": 16 } },
    { "u0": 0.25, "v0": 0, "u1": 0.375, "v1": 1, "w": 16, "h": 16, "hitbox": { "x": 0, "y": 0, "w": 16, "h": 16 } },
    { "u0": 0.375, "v0": 0, "u1": 0.5, "v1": 1, "w": 16, "h": 16, "hitbox": { "x": 0, "y": 0, "w": 16, "h": 16 } },
    { "u0": 0.5,  "v0": 0, "u1": 0.625, "v1": 1, "w": 16, "h": 16 },
    { "u0": 0.625, "v0": 0, "u1": 0.75, "v1": 1, "w": 16, "h": 16, "hitbox": { "x": 2, "y": 10, "w": 8, "h": 4 } }
  ]
}"#;

pub struct Assets {
    dir: TempDir,
}

impl Assets {
    pub fn new() -> Self {
        let assets = Self {
            dir: TempDir::new().unwrap(),
        };
        assets.write("atlases/items.json", ITEMS_ATLAS);
        assets
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn kind(&self, name: &str, source: &str) {
        self.write(&format!("objects/{name}.lua"), source);
    }

    pub fn stage_script(&self, name: &str, source: &str) {
        self.write(&format!("stages/{name}.lua"), source);
    }

    pub fn config(&self) -> GameConfig {
        GameConfig {
            render_width: SCREEN.w as u32,
            render_height: SCREEN.h as u32,
            assets_root: self.root().to_path_buf(),
            ..GameConfig::new()
        }
    }

    pub fn build(&self, name: &str) -> EngineResult<Stage> {
        let runtime = Rc::new(LuaRuntime::new(self.root(), SCREEN)?);
        let atlases = AtlasRegistry::load_dir(&self.root().join("atlases"))?;
        let sounds = SoundRegistry::new(self.root().join("sounds"));
        Stage::new(
            name,
            runtime,
            atlases,
            &sounds,
            StageOptions {
                screen: SCREEN,
                debug_hitboxes: false,
                time_scale: 1.0,
            },
        )
    }
}

/// Entity of the object called `name`.
pub fn find(stage: &Stage, name: &str) -> Option<Entity> {
    let id = NameId::of(name);
    let mut world = stage.world().borrow_mut();
    let mut query = world.query::<(Entity, &Identifiable)>();
    query
        .iter(&world)
        .find(|(_, ident)| ident.name == id)
        .map(|(entity, _)| entity)
}

/// Copy of a component of the object called `name`.
pub fn component<T: Component + Copy>(stage: &Stage, name: &str) -> T {
    let entity = find(stage, name).expect("object exists");
    *stage.world().borrow().get::<T>(entity).expect("component present")
}

/// Runs `source` inside the stage's sandbox.
pub fn eval(stage: &Stage, source: &str) -> LuaResult<LuaValue> {
    let ctx = stage.context();
    ctx.runtime().eval_in(ctx.environment(), source, "=test")
}

/// The stage script's `events` list.
pub fn events(stage: &Stage) -> Vec<String> {
    let table: LuaTable = stage.context().environment().get("events").unwrap();
    table
        .sequence_values::<String>()
        .collect::<LuaResult<_>>()
        .unwrap()
}
