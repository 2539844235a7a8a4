//! Filter primitives: one-pole low-pass and leaky integrator.
//!
//! Both operate on caller-owned memory so the render loop can keep every
//! piece of state in stack-local copies.

// IMPORTANT: RT path. No allocation, no locks, no logging.

use std::f32::consts::PI;

/// Magnitudes below this are flushed to zero to keep filter memory out of
/// the denormal range.
pub const DENORMAL_THRESHOLD: f32 = 1.0e-20;

/// Per-sample smoothing coefficient for a one-pole low-pass at `cutoff_hz`.
///
/// `alpha = 1 - e^(-2π·cutoff/sample_rate)`. Computed once per engine.
pub fn alpha_for_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    1.0 - (-2.0 * PI * cutoff_hz / sample_rate).exp()
}

/// One-pole low-pass step: `y += (x - y) * alpha`. Returns the new `y`.
#[inline]
pub fn one_pole(y: &mut f32, x: f32, alpha: f32) -> f32 {
    *y += (x - *y) * alpha;
    *y
}

/// Leaky integrator step: `y = (y + x·k) / (1 + k)`. Returns the new `y`.
///
/// For `|x| <= 1` the memory stays within `[-1, 1]`.
#[inline]
pub fn leaky_integrate(y: &mut f32, x: f32, k: f32) -> f32 {
    *y = (*y + x * k) / (1.0 + k);
    *y
}

/// Zero out denormal-range and non-finite values.
#[inline]
pub fn sanitize(x: f32) -> f32 {
    if !x.is_finite() || x.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        x
    }
}
