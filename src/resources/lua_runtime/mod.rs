//! Lua scripting runtime.
//!
//! This module provides the Lua integration layer: the global `engine` table,
//! the `viewport` global, stage sandbox environments, and the userdata handles
//! scripts use to reach objects and sounds.
//!
//! # Architecture
//!
//! - [`runtime`] - Core Lua runtime, `engine` table API and callback invocation
//! - [`proxy`] - Object handles (`self` in kind callbacks, entries of `pool`)
//! - [`sound`] - Sound handles registered in `pool` by stage definitions
//!
//! # Example
//!
//! ```lua
//! -- objects/coin.lua
//! return {
//!   atlas = "items",
//!   animations = {
//!     spin = { {0, 100}, {1, 100}, {2, 100}, {3, 100} },
//!   },
//!   on_collision = function(self, name, kind)
//!     if kind == "player" then
//!       pool.pickup:play()
//!       self:destroy()
//!     end
//!   end,
//! }
//! ```

mod proxy;
mod runtime;
mod sound;

pub use proxy::ObjectProxy;
pub use runtime::LuaRuntime;
pub use sound::SoundProxy;
