//! Sprite animation components.
//!
//! - [`Renderable`] is the per-entity playback state read by the presenter.
//! - [`Animatable`] points at the kind's shared [`AnimationSet`].
//!
//! Playback is advanced by [`crate::systems::animation::update_animations`].

use std::sync::Arc;

use bevy_ecs::prelude::Component;

use crate::resources::animationstore::AnimationSet;
use crate::resources::nametable::NameId;

/// Which sprite of which atlas is on screen, and how far into the current
/// keyframe playback is.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Renderable {
    pub atlas: NameId,
    pub animation: NameId,
    /// Milliseconds spent in the current keyframe.
    pub counter: f32,
    pub current_frame: usize,
    /// Resolved sprite index of `current_frame`.
    pub sprite: u32,
    /// Set once a `once` animation has reached its final keyframe.
    pub finished: bool,
}

impl Renderable {
    pub fn new(atlas: NameId, animation: NameId, sprite: u32) -> Self {
        Self {
            atlas,
            animation,
            counter: 0.0,
            current_frame: 0,
            sprite,
            finished: false,
        }
    }

    /// Starts `animation` from its first keyframe.
    pub fn switch_to(&mut self, animation: NameId, atlas: NameId, sprite: u32) {
        self.animation = animation;
        self.atlas = atlas;
        self.sprite = sprite;
        self.counter = 0.0;
        self.current_frame = 0;
        self.finished = false;
    }
}

#[derive(Component, Clone, Debug)]
pub struct Animatable {
    pub animations: Arc<AnimationSet>,
}

impl Animatable {
    pub fn new(animations: Arc<AnimationSet>) -> Self {
        Self { animations }
    }
}
