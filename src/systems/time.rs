//! Time update system.
//!
//! Updates the stage's [`WorldTime`](crate::resources::worldtime::WorldTime)
//! once per frame, applying `time_scale` to the provided delta and banking it
//! for the fixed-step physics loop.
use bevy_ecs::prelude::*;

use crate::resources::worldtime::WorldTime;

/// Update elapsed, delta and the fixed-step accumulator.
///
/// `dt` is the unscaled frame delta in seconds. Returns the scaled delta.
pub fn update_world_time(world: &mut World, dt: f32) -> f32 {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.accumulator += scaled_dt;
    wt.frame_count += 1;
    scaled_dt
}
