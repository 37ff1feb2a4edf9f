//! Screen exit/enter detection.
//!
//! An object is outside an edge when its collision box lies entirely beyond
//! it. Objects without a box never report transitions. The new edge mask is
//! stored before any callback runs, so a callback that moves the object back
//! produces an `on_screen_enter` on the next tick rather than re-entrancy.

use std::cell::RefCell;

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;

use crate::components::collidable::Collidable;
use crate::components::scriptable::{ScriptHook, Scriptable};
use crate::error::EngineResult;
use crate::resources::lua_runtime::LuaRuntime;
use crate::resources::physics::{Aabb, PhysicsWorld};
use crate::resources::screensize::ScreenSize;

pub const EDGE_LEFT: u8 = 1;
pub const EDGE_RIGHT: u8 = 2;
pub const EDGE_TOP: u8 = 4;
pub const EDGE_BOTTOM: u8 = 8;

/// Dispatch order.
const EDGES: [(u8, &str); 4] = [
    (EDGE_LEFT, "left"),
    (EDGE_RIGHT, "right"),
    (EDGE_TOP, "top"),
    (EDGE_BOTTOM, "bottom"),
];

/// Bitmask of the edges `aabb` is entirely beyond.
pub fn outside_edges(aabb: &Aabb, screen: ScreenSize) -> u8 {
    let mut mask = 0;
    if aabb.max_x < 0.0 {
        mask |= EDGE_LEFT;
    }
    if aabb.min_x > screen.w as f32 {
        mask |= EDGE_RIGHT;
    }
    if aabb.max_y < 0.0 {
        mask |= EDGE_TOP;
    }
    if aabb.min_y > screen.h as f32 {
        mask |= EDGE_BOTTOM;
    }
    mask
}

type Transitions = ArrayVec<(ScriptHook, &'static str), 4>;

fn transitions(previous: u8, current: u8) -> Transitions {
    let mut out = Transitions::new();
    for (bit, name) in EDGES {
        match (previous & bit != 0, current & bit != 0) {
            (false, true) => out.push((ScriptHook::ScreenExit, name)),
            (true, false) => out.push((ScriptHook::ScreenEnter, name)),
            _ => {}
        }
    }
    out
}

/// Compare every collidable's box against the viewport and notify changes.
pub fn dispatch_screen_bounds(runtime: &LuaRuntime, world: &RefCell<World>) -> EngineResult<()> {
    let pending: Vec<(Entity, Transitions)> = {
        let mut w = world.borrow_mut();
        let screen = *w.resource::<ScreenSize>();
        w.resource_scope(|w, physics: Mut<PhysicsWorld>| {
            let mut query = w.query::<(Entity, &Collidable, &mut Scriptable)>();
            query
                .iter_mut(w)
                .filter_map(|(entity, c, mut s)| {
                    let aabb = c.shape.and_then(|shape| physics.shape_aabb(shape))?;
                    let current = outside_edges(&aabb, screen);
                    if current == s.screen_previous {
                        return None;
                    }
                    let changes = transitions(s.screen_previous, current);
                    s.screen_previous = current;
                    Some((entity, changes))
                })
                .collect()
        })
    };

    for (entity, changes) in pending {
        for (hook, edge) in changes {
            runtime.call_hook(world, entity, hook, edge)?;
        }
    }
    Ok(())
}
