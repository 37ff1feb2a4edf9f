//! Draw-order key.
//!
//! Lower keys are drawn first. Changing the key through a script proxy marks
//! the [`RenderOrder`](crate::resources::renderorder::RenderOrder) dirty; the
//! re-sort happens at the end of the tick.

use bevy_ecs::prelude::Component;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Sorteable(pub i16);
