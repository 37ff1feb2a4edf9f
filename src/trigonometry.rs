//! Sine/cosine lookup in tenths of a degree.
//!
//! The table holds 3600 samples, one per 0.1°. Angles of any sign are folded
//! into `[0, 360)` before lookup, so callers can pass raw transform angles.

use std::sync::LazyLock;

const STEPS: usize = 3600;
const QUARTER: usize = STEPS / 4;

static SINE: LazyLock<[f32; STEPS]> = LazyLock::new(|| {
    let mut table = [0.0f32; STEPS];
    for (i, v) in table.iter_mut().enumerate() {
        *v = (i as f64 * std::f64::consts::TAU / STEPS as f64).sin() as f32;
    }
    table
});

#[inline]
fn index(degrees: f32) -> usize {
    let tenths = (degrees * 10.0).round() as i64;
    tenths.rem_euclid(STEPS as i64) as usize
}

/// Table sine of an angle in degrees.
#[inline]
pub fn lsin(degrees: f32) -> f32 {
    SINE[index(degrees)]
}

/// Table cosine of an angle in degrees.
#[inline]
pub fn lcos(degrees: f32) -> f32 {
    SINE[(index(degrees) + QUARTER) % STEPS]
}
