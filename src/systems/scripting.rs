//! Per-frame script callbacks.

use std::cell::RefCell;

use bevy_ecs::prelude::*;

use crate::components::scriptable::{ScriptHook, Scriptable};
use crate::error::EngineResult;
use crate::resources::lua_runtime::LuaRuntime;

/// Entities that define `hook`, in storage order.
pub fn entities_with_hook(world: &RefCell<World>, hook: ScriptHook) -> Vec<Entity> {
    let mut w = world.borrow_mut();
    let mut query = w.query::<(Entity, &Scriptable)>();
    query
        .iter(&w)
        .filter(|(_, s)| s.has_hook(hook))
        .map(|(e, _)| e)
        .collect()
}

/// Call `on_loop(self, delta)` on every object that defines it.
///
/// Objects destroyed by an earlier callback in the same pass are skipped.
pub fn run_loop_hooks(runtime: &LuaRuntime, world: &RefCell<World>, delta: f32) -> EngineResult<()> {
    for entity in entities_with_hook(world, ScriptHook::Loop) {
        runtime.call_hook(world, entity, ScriptHook::Loop, delta)?;
    }
    Ok(())
}
