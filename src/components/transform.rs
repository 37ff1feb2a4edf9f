//! Logical placement of an entity.
//!
//! `x`/`y` is the sprite centre in viewport pixels. `angle` is in degrees and
//! only affects drawing; collision boxes never rotate.

use bevy_ecs::prelude::Component;

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub angle: f32,
    /// 0 is fully transparent; a transparent entity has no collider.
    pub alpha: u8,
    pub shown: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            angle: 0.0,
            alpha: 255,
            shown: true,
        }
    }
}

impl Transform {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}
