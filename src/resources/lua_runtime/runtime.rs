//! Lua runtime core implementation.
//!
//! This module contains the [`LuaRuntime`] struct which owns the Lua state,
//! provides the `engine` table API and the read-only `viewport` global, and
//! knows how to evaluate scripts inside a stage's sandbox environment and
//! invoke per-entity callbacks.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use bevy_ecs::prelude::{Entity, World};
use mlua::prelude::*;

use log::{error, info, warn};

use crate::components::scriptable::{ScriptHook, Scriptable};
use crate::error::{EngineError, EngineResult};
use crate::resources::screensize::ScreenSize;

/// Shared state accessible from Lua function closures.
/// Stored in Lua's app_data so `engine.*` functions can queue requests.
struct LuaAppData {
    stage_request: RefCell<Option<String>>,
}

/// Owner of the Lua interpreter.
///
/// One runtime is shared by every stage of a [`Manager`](crate::manager::Manager);
/// each stage gets its own environment table from
/// [`new_environment`](Self::new_environment).
pub struct LuaRuntime {
    lua: Lua,
    assets_root: PathBuf,
}

impl LuaRuntime {
    /// Creates a new Lua runtime and registers the base engine API.
    ///
    /// `require` resolves modules from `<assets_root>/scripts/`.
    pub fn new(assets_root: &Path, viewport: ScreenSize) -> LuaResult<Self> {
        let lua = Lua::new();

        let scripts = assets_root.join("scripts");
        let package: LuaTable = lua.globals().get("package")?;
        let path: String = package.get("path")?;
        package.set(
            "path",
            format!(
                "{0}/?.lua;{0}/?/init.lua;{1}",
                scripts.display(),
                path
            ),
        )?;

        lua.set_app_data(LuaAppData {
            stage_request: RefCell::new(None),
        });

        let runtime = Self {
            lua,
            assets_root: assets_root.to_path_buf(),
        };
        runtime.register_base_api()?;
        runtime.register_stage_api()?;
        runtime.register_viewport(viewport)?;

        Ok(runtime)
    }

    /// Registers the `engine` table with logging functions.
    fn register_base_api(&self) -> LuaResult<()> {
        let engine = self.lua.create_table()?;

        // engine.log(message) - General purpose logging
        engine.set(
            "log",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        // engine.log_info(message) - Info level logging
        engine.set(
            "log_info",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        // engine.log_warn(message) - Warning level logging
        engine.set(
            "log_warn",
            self.lua.create_function(|_, msg: String| {
                warn!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        // engine.log_error(message) - Error level logging
        engine.set(
            "log_error",
            self.lua.create_function(|_, msg: String| {
                error!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        self.lua.globals().set("engine", engine)?;

        Ok(())
    }

    fn register_stage_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        // engine.set_stage(name) - Switch stages once the current tick ends
        engine.set(
            "set_stage",
            self.lua.create_function(|lua, name: String| {
                *lua.app_data_ref::<LuaAppData>()
                    .ok_or_else(|| LuaError::runtime("LuaAppData not found"))?
                    .stage_request
                    .borrow_mut() = Some(name);
                Ok(())
            })?,
        )?;

        Ok(())
    }

    /// Publishes `viewport = { width, height }` as a read-only global.
    fn register_viewport(&self, viewport: ScreenSize) -> LuaResult<()> {
        let data = self.lua.create_table()?;
        data.set("width", viewport.w)?;
        data.set("height", viewport.h)?;

        let meta = self.lua.create_table()?;
        meta.set("__index", data)?;
        meta.set(
            "__newindex",
            self.lua
                .create_function(|_, (_, key): (LuaValue, String)| -> LuaResult<()> {
                    Err(LuaError::runtime(format!("viewport.{key} is read-only")))
                })?,
        )?;

        let viewport = self.lua.create_table()?;
        viewport.set_metatable(Some(meta))?;
        self.lua.globals().set("viewport", viewport)
    }

    /// Takes the stage switch requested by `engine.set_stage`, if any.
    pub fn take_stage_request(&self) -> Option<String> {
        self.lua
            .app_data_ref::<LuaAppData>()
            .and_then(|data| data.stage_request.take())
    }

    /// Creates a sandbox table whose missing keys fall back to the globals.
    pub fn new_environment(&self) -> LuaResult<LuaTable> {
        let env = self.lua.create_table()?;
        let meta = self.lua.create_table()?;
        meta.set("__index", self.lua.globals())?;
        env.set_metatable(Some(meta))?;
        Ok(env)
    }

    /// Resolves a path relative to the assets root.
    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.assets_root.join(relative)
    }

    /// Reads a script file, reporting the path on failure.
    pub fn read_script(&self, path: &Path) -> EngineResult<String> {
        std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))
    }

    /// Evaluates `source` inside `env` and returns the chunk's result.
    pub fn eval_in(&self, env: &LuaTable, source: &str, name: &str) -> LuaResult<LuaValue> {
        self.lua
            .load(source)
            .set_name(name)
            .set_environment(env.clone())
            .eval()
    }

    /// Loads and runs a script file in the global environment.
    pub fn run_script(&self, path: &str) -> LuaResult<()> {
        let script = std::fs::read_to_string(path)
            .map_err(|e| LuaError::ExternalError(std::sync::Arc::new(e)))?;
        self.lua.load(&script).set_name(path).exec()
    }

    /// Invokes `hook` of `entity` with its proxy as first argument.
    ///
    /// Entities without the hook (or that no longer exist) are skipped. The
    /// world is only borrowed while the callback is looked up.
    pub fn call_hook<A>(
        &self,
        world: &RefCell<World>,
        entity: Entity,
        hook: ScriptHook,
        args: A,
    ) -> EngineResult<()>
    where
        A: IntoLuaMulti,
    {
        let resolved = {
            let w = world.borrow();
            match w.get::<Scriptable>(entity) {
                Some(scriptable) => match scriptable.hook(hook) {
                    Some(key) => Some((
                        self.lua.registry_value::<LuaFunction>(key)?,
                        self.lua.registry_value::<LuaValue>(scriptable.self_ref())?,
                    )),
                    None => None,
                },
                None => None,
            }
        };
        let Some((func, this)) = resolved else {
            return Ok(());
        };
        let mut args = args.into_lua_multi(&self.lua)?;
        args.push_front(this);
        func.call::<()>(args)?;
        Ok(())
    }

    /// Calls `table[name](args)` when it is a function.
    pub fn call_field<A>(&self, table: &LuaTable, name: &str, args: A) -> EngineResult<()>
    where
        A: IntoLuaMulti,
    {
        if let LuaValue::Function(func) = table.get::<LuaValue>(name)? {
            func.call::<()>(args)?;
        }
        Ok(())
    }

    /// Frees registry slots whose keys have been dropped.
    pub fn expire_registry_values(&self) {
        self.lua.expire_registry_values();
    }

    /// Returns a reference to the underlying Lua state.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }
}
