//! Script-side handle of a stage object.
//!
//! An [`ObjectProxy`] is what kind callbacks receive as `self` and what the
//! stage publishes in `pool[name]`. It reads and writes the entity's
//! components directly:
//!
//! | key         | access | component |
//! |-------------|--------|-----------|
//! | `x`, `y`    | rw     | transform (also moves the physics body) |
//! | `z`         | rw     | sort key (marks the render order dirty) |
//! | `scale`, `angle`, `alpha`, `shown` | rw | transform |
//! | `animation` | rw     | renderable (restarts playback) |
//! | `name`, `kind` | r   | identity |
//!
//! Any other key reads or writes the object's own kind table; reading `foo`
//! falls back to `on_foo` so kinds can call their callbacks as methods.
//!
//! Methods: `destroy()` removes the object, `alive()` tells whether it still
//! exists. Once the entity is destroyed the proxy goes inert: every read is
//! `nil` and every write is ignored.

use std::cell::RefCell;
use std::rc::Weak;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy_ecs::prelude::{Entity, World};
use mlua::prelude::*;

use crate::components::animation::{Animatable, Renderable};
use crate::components::collidable::Collidable;
use crate::components::identifiable::Identifiable;
use crate::components::sorteable::Sorteable;
use crate::components::transform::Transform;
use crate::object;
use crate::resources::nametable::{NameId, NameTable};
use crate::resources::physics::PhysicsWorld;
use crate::resources::renderorder::RenderOrder;

pub struct ObjectProxy {
    world: Weak<RefCell<World>>,
    entity: Entity,
    alive: Arc<AtomicBool>,
    table: LuaTable,
    pool: LuaTable,
    name: String,
}

impl ObjectProxy {
    pub fn new(
        world: Weak<RefCell<World>>,
        entity: Entity,
        alive: Arc<AtomicBool>,
        table: LuaTable,
        pool: LuaTable,
        name: &str,
    ) -> Self {
        Self {
            world,
            entity,
            alive,
            table,
            pool,
            name: name.to_owned(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && self.world.strong_count() > 0
    }

    /// Runs `f` against the live entity. `Ok(None)` when the entity is gone.
    fn with_world<R>(&self, f: impl FnOnce(&mut World, Entity) -> R) -> LuaResult<Option<R>> {
        if !self.alive.load(Ordering::Acquire) {
            return Ok(None);
        }
        let Some(world) = self.world.upgrade() else {
            return Ok(None);
        };
        let mut w = world
            .try_borrow_mut()
            .map_err(|_| LuaError::runtime("stage world is busy"))?;
        if w.get_entity(self.entity).is_err() {
            return Ok(None);
        }
        Ok(Some(f(&mut w, self.entity)))
    }

    fn index(&self, lua: &Lua, key: &str) -> LuaResult<LuaValue> {
        match self.with_world(|w, e| read_component(lua, w, e, key))? {
            None => Ok(LuaValue::Nil),
            Some(Err(err)) => Err(err),
            Some(Ok(Some(value))) => Ok(value),
            Some(Ok(None)) => {
                let value: LuaValue = self.table.get(key)?;
                if value.is_nil() {
                    self.table.get(format!("on_{key}"))
                } else {
                    Ok(value)
                }
            }
        }
    }

    fn new_index(&self, lua: &Lua, key: &str, value: LuaValue) -> LuaResult<()> {
        match self.with_world(|w, e| write_component(lua, w, e, key, value.clone()))? {
            None | Some(Ok(true)) => Ok(()),
            Some(Ok(false)) => self.table.set(key, value),
            Some(Err(err)) => Err(err),
        }
    }
}

/// `Ok(None)` means the key is not a component field.
fn read_component(lua: &Lua, w: &World, e: Entity, key: &str) -> LuaResult<Option<LuaValue>> {
    let t = w.get::<Transform>(e).copied().unwrap_or_default();
    let value = match key {
        "x" => LuaValue::Number(t.x as f64),
        "y" => LuaValue::Number(t.y as f64),
        "scale" => LuaValue::Number(t.scale as f64),
        "angle" => LuaValue::Number(t.angle as f64),
        "alpha" => LuaValue::Integer(t.alpha as _),
        "shown" => LuaValue::Boolean(t.shown),
        "z" => LuaValue::Integer(w.get::<Sorteable>(e).map_or(0, |s| s.0) as _),
        "animation" => {
            let name = w.get::<Renderable>(e).and_then(|r| {
                w.get::<Animatable>(e)
                    .and_then(|a| a.animations.get(r.animation))
                    .map(|def| def.name.clone())
            });
            match name {
                Some(name) => LuaValue::String(lua.create_string(&*name)?),
                None => LuaValue::Nil,
            }
        }
        "name" | "kind" => match w.get::<Identifiable>(e) {
            Some(id) => {
                let which = if key == "name" { id.name } else { id.kind };
                LuaValue::String(lua.create_string(w.resource::<NameTable>().display(which))?)
            }
            None => LuaValue::Nil,
        },
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// `Ok(false)` means the key is not a component field.
fn write_component(
    lua: &Lua,
    w: &mut World,
    e: Entity,
    key: &str,
    value: LuaValue,
) -> LuaResult<bool> {
    match key {
        "x" | "y" => {
            let n: f32 = lua.unpack(value)?;
            let position = w.get_mut::<Transform>(e).map(|mut t| {
                if key == "x" {
                    t.x = n;
                } else {
                    t.y = n;
                }
                (t.x, t.y)
            });
            if let (Some((x, y)), Some(c)) = (position, w.get::<Collidable>(e).copied()) {
                w.resource_mut::<PhysicsWorld>()
                    .set_transform(c.body, x + c.ox, y + c.oy);
            }
        }
        "scale" | "angle" => {
            let n: f32 = lua.unpack(value)?;
            if let Some(mut t) = w.get_mut::<Transform>(e) {
                if key == "scale" {
                    t.scale = n;
                } else {
                    t.angle = n;
                }
            }
        }
        "alpha" => {
            let n: f64 = lua.unpack(value)?;
            if let Some(mut t) = w.get_mut::<Transform>(e) {
                t.alpha = n.clamp(0.0, 255.0) as u8;
            }
        }
        "shown" => {
            let shown: bool = lua.unpack(value)?;
            if let Some(mut t) = w.get_mut::<Transform>(e) {
                t.shown = shown;
            }
        }
        "z" => {
            let z: i64 = lua.unpack(value)?;
            if let Some(mut s) = w.get_mut::<Sorteable>(e) {
                s.0 = z.clamp(i16::MIN as i64, i16::MAX as i64) as i16;
            }
            w.resource_mut::<RenderOrder>().mark_dirty();
        }
        "animation" => {
            let name: String = lua.unpack(value)?;
            let id = NameId::of(&name);
            let def = w
                .get::<Animatable>(e)
                .and_then(|a| a.animations.get(id))
                .map(|def| (def.atlas, def.keyframes[0].sprite));
            let Some((atlas, sprite)) = def else {
                return Err(LuaError::runtime(format!("unknown animation '{name}'")));
            };
            if let Some(mut r) = w.get_mut::<Renderable>(e) {
                r.switch_to(id, atlas, sprite);
            }
        }
        "name" | "kind" => {
            return Err(LuaError::runtime(format!("'{key}' is read-only")));
        }
        _ => return Ok(false),
    }
    Ok(true)
}

impl LuaUserData for ObjectProxy {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        // :alive() - Whether the object still exists
        methods.add_method("alive", |_, this, ()| Ok(this.is_alive()));

        // :destroy() - Remove the object from its stage
        methods.add_function("destroy", |_, ud: LuaAnyUserData| {
            let this = ud.borrow::<ObjectProxy>()?;
            let destroyed = this
                .with_world(|w, e| object::destroy(w, e))?
                .unwrap_or(false);
            if destroyed
                && let LuaValue::UserData(current) = this.pool.raw_get::<LuaValue>(this.name.as_str())?
                && current == ud
            {
                this.pool.raw_set(this.name.as_str(), LuaNil)?;
            }
            Ok(())
        });

        methods.add_meta_method(LuaMetaMethod::Index, |lua, this, key: String| {
            this.index(lua, &key)
        });

        methods.add_meta_method(
            LuaMetaMethod::NewIndex,
            |lua, this, (key, value): (String, LuaValue)| this.new_index(lua, &key, value),
        );

        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            Ok(format!("object<{}>", this.name))
        });
    }
}
