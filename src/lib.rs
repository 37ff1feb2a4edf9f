//! Stagehand library.
//!
//! A scriptable 2D stage runtime: stages and object kinds are Lua scripts,
//! objects live in a `bevy_ecs` world, animations are keyframe sequences over
//! sprite atlases and collisions come from sensor boxes that follow each
//! keyframe's hitbox.
//!
//! - [`components`] – ECS components of stage objects
//! - [`resources`] – stage resources (physics, render order, names, time) and the Lua host
//! - [`systems`] – the per-tick passes run by [`stage::Stage::on_loop`]
//! - [`manager`] – stage selection and transitions

pub mod components;
pub mod compositor;
pub mod definitions;
pub mod error;
pub mod manager;
pub mod object;
pub mod resources;
pub mod stage;
pub mod systems;
pub mod trigonometry;
