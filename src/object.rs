//! Object lifecycle.
//!
//! [`create`] turns a kind script plus placement data into a fully wired
//! entity (components, optional physics body, script proxy in `pool`) and runs
//! its `on_spawn` callback. [`destroy`] tears one down again.

use std::rc::Rc;

use bevy_ecs::prelude::*;
use log::debug;
use mlua::prelude::*;

use crate::components::animation::{Animatable, Renderable};
use crate::components::collidable::Collidable;
use crate::components::identifiable::Identifiable;
use crate::components::scriptable::{ProxyLink, ScriptHook, Scriptable};
use crate::components::sorteable::Sorteable;
use crate::components::transform::Transform;
use crate::error::{EngineError, EngineResult};
use crate::resources::atlasregistry::AtlasRegistry;
use crate::resources::lua_runtime::ObjectProxy;
use crate::resources::nametable::{NameId, NameTable};
use crate::resources::physics::{BodyDef, PhysicsWorld};
use crate::resources::renderorder::RenderOrder;
use crate::stage::StageContext;

/// Placement of a new object.
#[derive(Debug, Clone, Copy)]
pub struct ObjectSpec<'a> {
    pub z: i16,
    pub name: &'a str,
    pub kind: &'a str,
    pub x: f32,
    pub y: f32,
    pub animation: &'a str,
}

/// Spawns an object of `spec.kind` and runs its `on_spawn` callback.
///
/// The physics body is only created when the initial keyframe's sprite has a
/// hitbox; its shape is attached later by
/// [`sync_collidables`](crate::systems::collision::sync_collidables).
pub fn create(ctx: &StageContext, spec: &ObjectSpec) -> EngineResult<Entity> {
    let runtime = ctx.runtime();
    let lua = runtime.lua();
    let (table, animations) = ctx.load_kind(spec.kind)?;

    let animation = NameId::of(spec.animation);
    let Some(def) = animations.get(animation) else {
        return Err(EngineError::definition(format!(
            "kind '{}' has no animation '{}' (object '{}')",
            spec.kind, spec.animation, spec.name
        )));
    };
    let first = def.keyframes[0];

    let entity = {
        let mut world = ctx.world().borrow_mut();
        let sprite = world
            .resource::<AtlasRegistry>()
            .sprite(def.atlas, first.sprite)
            .copied();
        let Some(sprite) = sprite else {
            return Err(EngineError::definition(format!(
                "kind '{}': animation '{}' uses a sprite missing from its atlas",
                spec.kind, spec.animation
            )));
        };

        let identity = {
            let mut names = world.resource_mut::<NameTable>();
            Identifiable {
                kind: names.intern(spec.kind),
                name: names.intern(spec.name),
            }
        };

        let entity = world
            .spawn((
                Sorteable(spec.z),
                Transform::at(spec.x, spec.y),
                Renderable::new(def.atlas, animation, first.sprite),
                Animatable::new(animations.clone()),
                identity,
            ))
            .id();

        if sprite.has_hitbox() {
            let body = world.resource_mut::<PhysicsWorld>().create_body(BodyDef {
                x: spec.x,
                y: spec.y,
            });
            world.entity_mut(entity).insert(Collidable::new(body));
        }
        world.resource_mut::<RenderOrder>().push(entity);
        entity
    };

    let (link, alive) = ProxyLink::new();
    let proxy = lua.create_userdata(ObjectProxy::new(
        Rc::downgrade(ctx.world()),
        entity,
        alive,
        table.clone(),
        ctx.pool().clone(),
        spec.name,
    ))?;
    ctx.pool().set(spec.name, &proxy)?;

    let mut scriptable = Scriptable::new(lua.create_registry_value(proxy)?, link);
    for hook in ScriptHook::ALL {
        if let LuaValue::Function(f) = table.get::<LuaValue>(hook.field())? {
            scriptable.set_hook(hook, lua.create_registry_value(f)?);
        }
    }
    ctx.world().borrow_mut().entity_mut(entity).insert(scriptable);

    debug!(
        "created object '{}' of kind '{}' at ({}, {})",
        spec.name, spec.kind, spec.x, spec.y
    );

    runtime.call_hook(ctx.world(), entity, ScriptHook::Spawn, ())?;
    Ok(entity)
}

/// Destroys an entity together with its physics body.
///
/// Dropping the [`Scriptable`] releases every callback reference and turns
/// the script proxy inert. Returns `false` if the entity was already gone.
pub fn destroy(world: &mut World, entity: Entity) -> bool {
    if world.get_entity(entity).is_err() {
        return false;
    }
    if let Some(collidable) = world.get::<Collidable>(entity).copied() {
        world
            .resource_mut::<PhysicsWorld>()
            .destroy_body(collidable.body);
    }
    world.resource_mut::<RenderOrder>().remove(entity);
    world.despawn(entity)
}
