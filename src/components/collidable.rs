//! Link between an entity and its physics body.
//!
//! The shape is created lazily by the collision synchroniser from the current
//! keyframe's hitbox; `hx..hh` remember the scaled hitbox it was built from so
//! unchanged frames do not touch the physics world.

use bevy_ecs::prelude::Component;

use crate::resources::physics::{BodyHandle, ShapeHandle};

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Collidable {
    pub body: BodyHandle,
    pub shape: Option<ShapeHandle>,
    pub hx: f32,
    pub hy: f32,
    pub hw: f32,
    pub hh: f32,
    /// Offset from the transform position to the body centre.
    pub ox: f32,
    pub oy: f32,
}

impl Collidable {
    pub fn new(body: BodyHandle) -> Self {
        Self {
            body,
            shape: None,
            hx: 0.0,
            hy: 0.0,
            hw: 0.0,
            hh: 0.0,
            ox: 0.0,
            oy: 0.0,
        }
    }

    /// Forgets the synced hitbox geometry, returning the detached shape.
    pub fn detach(&mut self) -> Option<ShapeHandle> {
        self.hx = 0.0;
        self.hy = 0.0;
        self.hw = 0.0;
        self.hh = 0.0;
        self.shape.take()
    }

    pub fn matches(&self, hx: f32, hy: f32, hw: f32, hh: f32) -> bool {
        self.hx == hx && self.hy == hy && self.hw == hw && self.hh == hh
    }
}
