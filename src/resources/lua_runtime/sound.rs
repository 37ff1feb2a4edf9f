//! Script-side handle of a stage sound.
//!
//! ```lua
//! pool.coin.volume = 0.5
//! pool.coin.on_end = function(sound) engine.log("done") end
//! pool.coin:play()
//! ```

use std::rc::Rc;

use mlua::prelude::*;

use crate::resources::soundregistry::SoundFx;

pub struct SoundProxy {
    fx: Rc<SoundFx>,
    on_start: Option<LuaFunction>,
    on_end: Option<LuaFunction>,
}

impl SoundProxy {
    pub fn new(fx: Rc<SoundFx>) -> Self {
        Self {
            fx,
            on_start: None,
            on_end: None,
        }
    }

    pub fn fx(&self) -> &Rc<SoundFx> {
        &self.fx
    }

    pub fn on_start(&self) -> Option<&LuaFunction> {
        self.on_start.as_ref()
    }

    pub fn on_end(&self) -> Option<&LuaFunction> {
        self.on_end.as_ref()
    }
}

fn handler(value: LuaValue) -> LuaResult<Option<LuaFunction>> {
    match value {
        LuaValue::Nil => Ok(None),
        LuaValue::Function(f) => Ok(Some(f)),
        other => Err(LuaError::runtime(format!(
            "sound handler must be a function, got {}",
            other.type_name()
        ))),
    }
}

impl LuaUserData for SoundProxy {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        // :play() - Start playback
        methods.add_method("play", |_, this, ()| {
            this.fx.play();
            Ok(())
        });

        // :stop() - Stop playback
        methods.add_method("stop", |_, this, ()| {
            this.fx.stop();
            Ok(())
        });

        methods.add_meta_method(LuaMetaMethod::Index, |lua, this, key: String| {
            Ok(match key.as_str() {
                "name" => LuaValue::String(lua.create_string(this.fx.name())?),
                "playing" => LuaValue::Boolean(this.fx.is_playing()),
                "loop" => LuaValue::Boolean(this.fx.is_looping()),
                "volume" => LuaValue::Number(this.fx.volume() as f64),
                "on_start" => this.on_start.clone().map_or(LuaValue::Nil, LuaValue::Function),
                "on_end" => this.on_end.clone().map_or(LuaValue::Nil, LuaValue::Function),
                _ => LuaValue::Nil,
            })
        });

        methods.add_meta_method_mut(
            LuaMetaMethod::NewIndex,
            |lua, this, (key, value): (String, LuaValue)| {
                match key.as_str() {
                    "volume" => this.fx.set_volume(lua.unpack(value)?),
                    "loop" => this.fx.set_looping(lua.unpack(value)?),
                    "on_start" => this.on_start = handler(value)?,
                    "on_end" => this.on_end = handler(value)?,
                    _ => {
                        return Err(LuaError::runtime(format!(
                            "sound has no writable field '{key}'"
                        )));
                    }
                }
                Ok(())
            },
        );
    }
}
