//! Stage clock.
//!
//! Tracks the variable frame delta alongside the fixed-timestep accumulator
//! that paces the physics sub-loop.

use bevy_ecs::prelude::Resource;

/// Physics runs at exactly this step, independent of the frame rate.
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    /// Unconsumed time waiting for the next fixed step.
    pub accumulator: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            accumulator: 0.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Consumes one fixed step from the accumulator if enough time is banked.
    pub fn consume_fixed_step(&mut self) -> bool {
        if self.accumulator >= FIXED_TIMESTEP {
            self.accumulator -= FIXED_TIMESTEP;
            true
        } else {
            false
        }
    }
}
