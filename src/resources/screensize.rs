//! Viewport size resource.
//!
//! The logical render resolution. Screen-boundary checks compare collision
//! boxes against `0..w` and `0..h`; scripts see the same values through the
//! `viewport` global.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct ScreenSize {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}
