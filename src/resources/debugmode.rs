//! Debug toggle resource.
//!
//! The mere presence of this resource indicates that the presenter should
//! also draw collision hitboxes. Remove it to disable the overlay.

use bevy_ecs::prelude::Resource;

/// Marker resource: when present, hitbox outlines are submitted after sprites.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct DebugMode {}
