//! Stage systems.
//!
//! Each submodule is one pass of [`Stage::on_loop`](crate::stage::Stage::on_loop)
//! or of drawing.
//!
//! Submodules overview
//! - [`animation`] – advance keyframes and report finished sequences
//! - [`collision`] – keep sensor boxes on the current keyframe, dispatch overlaps
//! - [`render`] – emit draw commands in render order
//! - [`screenbounds`] – screen exit/enter callbacks
//! - [`scripting`] – per-object `on_loop`
//! - [`sort`] – re-sort the render order when dirty
//! - [`sound`] – sound start/end handlers
//! - [`time`] – frame delta and fixed-step accumulator

pub mod animation;
pub mod collision;
pub mod render;
pub mod screenbounds;
pub mod scripting;
pub mod sort;
pub mod sound;
pub mod time;
