//! Collision systems.
//!
//! - [`sync_collidables`] rebuilds each object's sensor box from the hitbox of
//!   the sprite it currently shows and moves its body to match the transform.
//! - [`dispatch_sensor_events`] forwards the begin/end overlaps of one physics
//!   step to `on_collision` / `on_collision_end`.
//!
//! # Collision Flow
//!
//! 1. The stage steps the [`PhysicsWorld`] at a fixed rate
//! 2. Each step's sensor events are dispatched immediately, begin events
//!    first; the sensor side receives `(self, other_name, other_kind)`
//! 3. After the animator has run, `sync_collidables` makes the boxes follow
//!    the new keyframes

use std::cell::RefCell;

use bevy_ecs::prelude::*;
use log::error;

use crate::components::animation::Renderable;
use crate::components::collidable::Collidable;
use crate::components::identifiable::Identifiable;
use crate::components::scriptable::{ScriptHook, Scriptable};
use crate::components::transform::Transform;
use crate::error::EngineResult;
use crate::resources::atlasregistry::AtlasRegistry;
use crate::resources::lua_runtime::LuaRuntime;
use crate::resources::nametable::NameTable;
use crate::resources::physics::{PhysicsWorld, SensorEvent, SensorEvents, ShapeDef};

/// Align physics shapes and bodies with the current keyframe and transform.
///
/// Contract
/// - Reads [`AtlasRegistry`] for the hitbox of each entity's current sprite.
/// - A sprite without hitbox, or an alpha of 0, detaches the shape.
/// - The shape is created or resized only when the scaled hitbox changed.
/// - The body is moved every call, with identity rotation.
pub fn sync_collidables(world: &mut World) {
    let atlases = world.resource::<AtlasRegistry>().clone();
    world.resource_scope(|world, mut physics: Mut<PhysicsWorld>| {
        let mut query = world.query::<(Entity, &Transform, &Renderable, &mut Collidable)>();
        for (entity, t, r, mut c) in query.iter_mut(world) {
            let Some(sprite) = atlases.sprite(r.atlas, r.sprite) else {
                error!(
                    "entity {:?} shows sprite {} missing from its atlas",
                    entity, r.sprite
                );
                debug_assert!(false, "renderable references a missing sprite");
                continue;
            };

            if !sprite.has_hitbox() || t.alpha == 0 {
                if let Some(shape) = c.detach() {
                    physics.destroy_shape(shape);
                }
                continue;
            }

            let hx = sprite.hitbox.x * t.scale;
            let hy = sprite.hitbox.y * t.scale;
            let hw = sprite.hitbox.w * t.scale;
            let hh = sprite.hitbox.h * t.scale;
            let ox = -sprite.w * t.scale * 0.5 + hx + hw * 0.5;
            let oy = -sprite.h * t.scale * 0.5 + hy + hh * 0.5;

            if !c.matches(hx, hy, hw, hh) || c.shape.is_none() {
                match c.shape {
                    Some(shape) => physics.set_box(shape, hw * 0.5, hh * 0.5),
                    None => {
                        c.shape = physics.create_box_shape(
                            c.body,
                            ShapeDef {
                                sensor: true,
                                sensor_events: true,
                                user_data: Some(entity),
                            },
                            hw * 0.5,
                            hh * 0.5,
                        );
                    }
                }
                c.hx = hx;
                c.hy = hy;
                c.hw = hw;
                c.hh = hh;
            }

            c.ox = ox;
            c.oy = oy;
            physics.set_transform(c.body, t.x + ox, t.y + oy);
        }
    });
}

/// Entity to call, plus the other side's name and kind.
fn resolve(world: &World, event: &SensorEvent, hook: ScriptHook) -> Option<(Entity, String, String)> {
    let physics = world.resource::<PhysicsWorld>();
    if !physics.shape_is_valid(event.sensor) || !physics.shape_is_valid(event.visitor) {
        return None;
    }
    let a = physics.shape_user_data(event.sensor)?;
    let b = physics.shape_user_data(event.visitor)?;
    if !world.get::<Scriptable>(a)?.has_hook(hook) {
        return None;
    }
    let id = world.get::<Identifiable>(b)?;
    let names = world.resource::<NameTable>();
    Some((
        a,
        names.display(id.name).to_owned(),
        names.display(id.kind).to_owned(),
    ))
}

/// Forward one step's sensor events to scripts.
///
/// Events whose shapes died before their turn (for instance destroyed by an
/// earlier callback of the same batch) are skipped.
pub fn dispatch_sensor_events(
    runtime: &LuaRuntime,
    world: &RefCell<World>,
    events: SensorEvents,
) -> EngineResult<()> {
    let begin = events.begin.into_iter().map(|e| (e, ScriptHook::Collision));
    let end = events.end.into_iter().map(|e| (e, ScriptHook::CollisionEnd));
    for (event, hook) in begin.chain(end) {
        let target = resolve(&world.borrow(), &event, hook);
        if let Some((entity, name, kind)) = target {
            runtime.call_hook(world, entity, hook, (name, kind))?;
        }
    }
    Ok(())
}
