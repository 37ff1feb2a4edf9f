//! Stage lifecycle.
//!
//! A [`Stage`] is one scene: its own ECS world, physics world, name table and
//! Lua sandbox. It is built from `stages/<name>.lua`, which returns a table
//! with the sounds and objects to create plus optional `on_enter`,
//! `on_loop(delta)` and `on_leave` hooks.
//!
//! # Tick order
//!
//! [`Stage::on_loop`] runs, in this order:
//!
//! 1. Fixed-step physics: one step per banked 1/60 s, each followed by its
//!    `on_collision` / `on_collision_end` callbacks
//! 2. The animator, with `on_animation_end` callbacks
//! 3. Collision boxes follow the new keyframes and positions
//! 4. `on_loop(self, delta)` of every object
//! 5. `on_screen_exit` / `on_screen_enter`
//! 6. The render order is re-sorted if any sort key changed
//! 7. Sound `on_start` / `on_end` handlers
//! 8. The stage's own `on_loop(delta)`
//!
//! The world is never borrowed while a script runs.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::{debug, error, info};
use mlua::prelude::*;
use rustc_hash::FxHashMap;

use crate::compositor::Compositor;
use crate::components::identifiable::Identifiable;
use crate::components::scriptable::ScriptHook;
use crate::definitions::{StageDefinition, parse_animations};
use crate::error::{EngineError, EngineResult};
use crate::object::{self, ObjectSpec};
use crate::resources::animationstore::AnimationSet;
use crate::resources::atlasregistry::AtlasRegistry;
use crate::resources::debugmode::DebugMode;
use crate::resources::lua_runtime::{LuaRuntime, SoundProxy};
use crate::resources::nametable::NameTable;
use crate::resources::physics::PhysicsWorld;
use crate::resources::renderorder::RenderOrder;
use crate::resources::screensize::ScreenSize;
use crate::resources::soundregistry::SoundRegistry;
use crate::resources::worldtime::{FIXED_TIMESTEP, WorldTime};
use crate::systems::animation::update_animations;
use crate::systems::collision::{dispatch_sensor_events, sync_collidables};
use crate::systems::render::present;
use crate::systems::screenbounds::dispatch_screen_bounds;
use crate::systems::scripting::run_loop_hooks;
use crate::systems::sort::sort_render_order;
use crate::systems::sound::dispatch_sounds;
use crate::systems::time::update_world_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Constructed,
    Entered,
    Looping,
    Left,
}

/// Per-stage settings supplied by the manager.
#[derive(Debug, Clone, Copy)]
pub struct StageOptions {
    pub screen: ScreenSize,
    pub debug_hitboxes: bool,
    /// Scale applied to every delta handed to [`Stage::on_loop`].
    pub time_scale: f32,
}

/// A kind script read from disk, with its validated animations once parsed.
struct KindEntry {
    source: Rc<str>,
    chunk: Rc<str>,
    animations: Option<Arc<AnimationSet>>,
}

/// What object creation needs from its stage.
pub struct StageContext {
    name: String,
    runtime: Rc<LuaRuntime>,
    world: Rc<RefCell<World>>,
    environment: LuaTable,
    pool: LuaTable,
    kinds: RefCell<FxHashMap<String, KindEntry>>,
}

impl StageContext {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runtime(&self) -> &LuaRuntime {
        &self.runtime
    }

    pub fn world(&self) -> &Rc<RefCell<World>> {
        &self.world
    }

    /// The stage's sandbox; missing keys fall back to the globals.
    pub fn environment(&self) -> &LuaTable {
        &self.environment
    }

    /// `pool[name]` holds every object proxy and sound handle of the stage.
    pub fn pool(&self) -> &LuaTable {
        &self.pool
    }

    /// Evaluates `objects/<kind>.lua` and returns a fresh instance table
    /// together with the kind's animations.
    ///
    /// The file is read and its animations validated once per stage; every
    /// call re-runs the chunk so instances never share mutable state.
    pub fn load_kind(&self, kind: &str) -> EngineResult<(LuaTable, Arc<AnimationSet>)> {
        let (source, chunk, cached) = {
            let mut kinds = self.kinds.borrow_mut();
            if !kinds.contains_key(kind) {
                let path = self.runtime.asset_path(format!("objects/{kind}.lua"));
                let source = self.runtime.read_script(&path)?;
                debug!("loaded kind '{}' from {}", kind, path.display());
                kinds.insert(
                    kind.to_owned(),
                    KindEntry {
                        source: source.into(),
                        chunk: format!("@objects/{kind}.lua").into(),
                        animations: None,
                    },
                );
            }
            let entry = &kinds[kind];
            (
                entry.source.clone(),
                entry.chunk.clone(),
                entry.animations.clone(),
            )
        };

        let value = self.runtime.eval_in(&self.environment, &source, &chunk)?;
        let LuaValue::Table(table) = value else {
            return Err(EngineError::definition(format!(
                "objects/{kind}.lua must return a table, got {}",
                value.type_name()
            )));
        };

        let animations = match cached {
            Some(animations) => animations,
            None => {
                let animations = Arc::new(parse_animations(kind, &table)?);
                if let Some(entry) = self.kinds.borrow_mut().get_mut(kind) {
                    entry.animations = Some(animations.clone());
                }
                animations
            }
        };
        Ok((table, animations))
    }
}

pub struct Stage {
    ctx: StageContext,
    definition: LuaTable,
    sounds: Vec<LuaAnyUserData>,
    next_z: i16,
    state: StageState,
}

impl Stage {
    /// Builds the stage named `name`: evaluates its script, registers its
    /// sounds and creates its objects (running their `on_spawn`).
    pub fn new(
        name: &str,
        runtime: Rc<LuaRuntime>,
        atlases: AtlasRegistry,
        sounds: &SoundRegistry,
        options: StageOptions,
    ) -> EngineResult<Self> {
        let mut world = World::new();
        world.insert_resource(PhysicsWorld::new());
        world.insert_resource(NameTable::default());
        world.insert_resource(RenderOrder::default());
        world.insert_resource(WorldTime::default().with_time_scale(options.time_scale));
        world.insert_resource(options.screen);
        world.insert_resource(atlases);
        if options.debug_hitboxes {
            world.insert_resource(DebugMode {});
        }

        let environment = runtime.new_environment()?;
        let pool = runtime.lua().create_table()?;
        environment.set("pool", &pool)?;

        let path = runtime.asset_path(format!("stages/{name}.lua"));
        let source = runtime.read_script(&path)?;
        let value = runtime.eval_in(&environment, &source, &format!("@stages/{name}.lua"))?;
        let LuaValue::Table(definition) = value else {
            return Err(EngineError::definition(format!(
                "stages/{name}.lua must return a table, got {}",
                value.type_name()
            )));
        };
        let data = StageDefinition::from_table(runtime.lua(), name, &definition)?;

        let mut stage = Stage {
            ctx: StageContext {
                name: name.to_owned(),
                runtime,
                world: Rc::new(RefCell::new(world)),
                environment,
                pool,
                kinds: RefCell::new(FxHashMap::default()),
            },
            definition,
            sounds: Vec::with_capacity(data.sounds.len()),
            next_z: 0,
            state: StageState::Constructed,
        };

        for sound in &data.sounds {
            let fx = sounds.get_or_load(sound);
            let ud = stage.ctx.runtime.lua().create_userdata(SoundProxy::new(fx))?;
            stage.ctx.pool.set(sound.as_str(), &ud)?;
            stage.sounds.push(ud);
        }

        for entry in &data.objects {
            stage.spawn(&ObjectSpec {
                z: stage.next_z,
                name: &entry.name,
                kind: &entry.kind,
                x: entry.x,
                y: entry.y,
                animation: &entry.animation,
            })?;
            stage.next_z = stage.next_z.saturating_add(1);
        }

        sync_collidables(&mut stage.ctx.world.borrow_mut());

        info!(
            "stage '{}' built: {} objects, {} sounds",
            name,
            data.objects.len(),
            data.sounds.len()
        );
        Ok(stage)
    }

    fn spawn(&self, spec: &ObjectSpec) -> EngineResult<Entity> {
        object::create(&self.ctx, spec)
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    pub fn world(&self) -> &Rc<RefCell<World>> {
        &self.ctx.world
    }

    pub fn pool(&self) -> &LuaTable {
        &self.ctx.pool
    }

    pub fn on_enter(&mut self) -> EngineResult<()> {
        info!("entering stage '{}'", self.ctx.name);
        self.state = StageState::Entered;
        self.ctx.runtime.call_field(&self.definition, "on_enter", ())
    }

    /// Advances the stage by `delta` seconds. See the module docs for the
    /// order of work.
    pub fn on_loop(&mut self, delta: f32) -> EngineResult<()> {
        self.state = StageState::Looping;
        let runtime = &*self.ctx.runtime;
        let world = &*self.ctx.world;

        let delta = update_world_time(&mut world.borrow_mut(), delta);

        loop {
            let events = {
                let mut w = world.borrow_mut();
                if !w.resource_mut::<WorldTime>().consume_fixed_step() {
                    break;
                }
                let mut physics = w.resource_mut::<PhysicsWorld>();
                physics.step(FIXED_TIMESTEP);
                physics.take_sensor_events()
            };
            if !events.is_empty() {
                dispatch_sensor_events(runtime, world, events)?;
            }
        }

        update_animations(world, delta, |entity, finished| {
            runtime.call_hook(world, entity, ScriptHook::AnimationEnd, finished)
        })?;

        sync_collidables(&mut world.borrow_mut());
        run_loop_hooks(runtime, world, delta)?;
        dispatch_screen_bounds(runtime, world)?;
        sort_render_order(&mut world.borrow_mut());
        dispatch_sounds(&self.sounds)?;
        runtime.call_field(&self.definition, "on_loop", delta)?;

        runtime.expire_registry_values();
        Ok(())
    }

    pub fn on_draw(&self, compositor: &mut dyn Compositor) {
        present(&self.ctx.world.borrow(), compositor);
    }

    pub fn on_leave(&mut self) -> EngineResult<()> {
        info!("leaving stage '{}'", self.ctx.name);
        self.state = StageState::Left;
        self.ctx.runtime.call_field(&self.definition, "on_leave", ())
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        if let Err(e) = self.ctx.pool.clear() {
            error!("clearing pool of stage '{}' failed: {}", self.ctx.name, e);
        }
        if let Ok(mut world) = self.ctx.world.try_borrow_mut() {
            let entities: Vec<Entity> = world
                .query_filtered::<Entity, With<Identifiable>>()
                .iter(&world)
                .collect();
            for entity in entities {
                object::destroy(&mut world, entity);
            }
            world.resource_mut::<NameTable>().clear();
        }
        self.ctx.runtime.expire_registry_values();
        debug!("stage '{}' destroyed", self.ctx.name);
    }
}
