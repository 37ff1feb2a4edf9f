//! Kind and stage definition parsing.
//!
//! Both formats are plain Lua tables returned by a script:
//!
//! ```lua
//! -- objects/player.lua
//! return {
//!   atlas = "hero",
//!   animations = {
//!     idle = { {0, 200}, {1, 200} },
//!     jump = { {4, 80}, {5, 80}, next = "fall" },
//!     fall = { {6, 100}, atlas = "hero_air" },
//!     die  = { {8, 60}, {9, 60}, once = true },
//!   },
//! }
//!
//! -- stages/level1.lua
//! return {
//!   sounds = { "jump", "coin" },
//!   objects = {
//!     { kind = "player", name = "hero", x = 40, y = 120, animation = "idle" },
//!   },
//!   on_enter = function() end,
//!   on_loop = function(delta) end,
//!   on_leave = function() end,
//! }
//! ```
//!
//! Every problem found here is an [`EngineError::Definition`].

use mlua::prelude::*;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::error::{EngineError, EngineResult};
use crate::resources::animationstore::{
    AnimationDef, AnimationSet, EndPolicy, INLINE_KEYFRAMES, Keyframe,
};
use crate::resources::nametable::NameId;

/// Reads `key` from `table`, turning a type mismatch into a definition
/// error that names where it happened.
fn field<T: FromLua>(
    table: &LuaTable,
    key: impl IntoLua,
    location: impl FnOnce() -> String,
) -> EngineResult<T> {
    table
        .get(key)
        .map_err(|e| EngineError::definition(format!("{}: {e}", location())))
}

/// Builds the animation table of `kind` from its script table.
pub fn parse_animations(kind: &str, table: &LuaTable) -> EngineResult<AnimationSet> {
    let default_atlas: Option<String> =
        field(table, "atlas", || format!("kind '{kind}' field 'atlas'"))?;
    let animations: Option<LuaTable> =
        field(table, "animations", || format!("kind '{kind}' field 'animations'"))?;
    let Some(animations) = animations else {
        return Err(EngineError::definition(format!(
            "kind '{kind}' has no animations table"
        )));
    };

    let mut defs = Vec::new();
    let mut chains: Vec<(String, String)> = Vec::new();
    for pair in animations.pairs::<String, LuaTable>() {
        let (name, anim) = pair.map_err(|e| {
            EngineError::definition(format!("kind '{kind}': malformed animation entry: {e}"))
        })?;
        let at = |what: &str| format!("kind '{kind}': animation '{name}' field '{what}'");

        let atlas: Option<String> = field(&anim, "atlas", || at("atlas"))?;
        let Some(atlas) = atlas.or_else(|| default_atlas.clone()) else {
            return Err(EngineError::definition(format!(
                "kind '{kind}': animation '{name}' has no atlas"
            )));
        };

        let mut keyframes: SmallVec<[Keyframe; INLINE_KEYFRAMES]> = SmallVec::new();
        for (i, frame) in anim.sequence_values::<LuaTable>().enumerate() {
            let n = i + 1;
            let frame = frame.map_err(|e| {
                EngineError::definition(format!(
                    "kind '{kind}': animation '{name}' keyframe {n} is not a table: {e}"
                ))
            })?;
            let keyframe_at = |what: &str| {
                format!("kind '{kind}': animation '{name}' keyframe {n} {what}")
            };
            let sprite: Option<u32> = field(&frame, 1, || keyframe_at("sprite"))?;
            let duration: Option<u32> = field(&frame, 2, || keyframe_at("duration"))?;
            let (Some(sprite), Some(duration)) = (sprite, duration) else {
                return Err(EngineError::definition(format!(
                    "kind '{kind}': animation '{name}' keyframe {n} needs {{sprite, duration}}"
                )));
            };
            keyframes.push(Keyframe::new(sprite, duration));
        }

        let next: Option<String> = field(&anim, "next", || at("next"))?;
        let once: Option<bool> = field(&anim, "once", || at("once"))?;
        let policy = match (next, once.unwrap_or(false)) {
            (Some(_), true) => {
                return Err(EngineError::definition(format!(
                    "kind '{kind}': animation '{name}' sets both next and once"
                )));
            }
            (Some(next), false) => {
                let id = NameId::of(&next);
                chains.push((name.clone(), next));
                EndPolicy::Next(id)
            }
            (None, true) => EndPolicy::Once,
            (None, false) => EndPolicy::Loop,
        };

        defs.push(AnimationDef::new(
            &name,
            NameId::of(&atlas),
            &keyframes,
            policy,
        ));
    }

    for (name, next) in &chains {
        if !defs.iter().any(|def| &*def.name == next.as_str()) {
            return Err(EngineError::definition(format!(
                "kind '{kind}': animation '{name}' chains to unknown animation '{next}'"
            )));
        }
    }

    AnimationSet::new(kind, defs)
}

/// One entry of a stage's `objects` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectEntry {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub animation: String,
}

/// The data half of a stage script; hooks stay in the Lua table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StageDefinition {
    #[serde(default)]
    pub sounds: Vec<String>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

impl StageDefinition {
    pub fn from_table(lua: &Lua, stage: &str, table: &LuaTable) -> EngineResult<Self> {
        let data = lua.create_table()?;
        for key in ["sounds", "objects"] {
            let value: LuaValue = table.get(key)?;
            if let LuaValue::Table(list) = &value
                && list.raw_len() == 0
            {
                // Empty Lua tables deserialize as maps; treat them as empty lists.
                continue;
            }
            data.set(key, value)?;
        }
        lua.from_value(LuaValue::Table(data)).map_err(|e| {
            EngineError::definition(format!("stage '{stage}' is malformed: {e}"))
        })
    }
}
