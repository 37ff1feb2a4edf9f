//! Stage and engine resources.
//!
//! Overview
//! - `animationstore` – validated animation tables, one per object kind
//! - `atlasregistry` – sprite metadata (UVs, size, hitbox) loaded from JSON
//! - `debugmode` – presence toggles the hitbox overlay
//! - `gameconfig` – INI configuration
//! - `lua_runtime` – Lua host, `engine` API and script handles
//! - `nametable` – interned kind and object names
//! - `physics` – sensor boxes, bodies and overlap events
//! - `renderorder` – draw order with its dirty flag
//! - `screensize` – viewport used for screen exit/enter
//! - `soundregistry` – sound handles and their start/end transitions
//! - `worldtime` – frame delta and fixed-step accumulator
pub mod animationstore;
pub mod atlasregistry;
pub mod debugmode;
pub mod gameconfig;
pub mod lua_runtime;
pub mod nametable;
pub mod physics;
pub mod renderorder;
pub mod screensize;
pub mod soundregistry;
pub mod worldtime;
