//! Stateless angle helpers. Angles are in radians unless the name says otherwise.
//!
//! Every heading comparison in the pipeline goes through these functions;
//! raw radian or degree values are never compared directly.

use core::f64::consts::PI;

/// 2π.
pub const TWO_PI: f64 = 2.0 * PI;

/// π/2.
pub const PI_BY_2: f64 = PI / 2.0;

#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * (PI / 180.0)
}

#[inline]
pub fn to_degrees(radians: f64) -> f64 {
    radians * (180.0 / PI)
}

/// Maps any angle into `[0, 2π)` using a floored modulo, so negative inputs
/// wrap upward instead of truncating toward zero.
#[inline]
pub fn normalize_positive(radians: f64) -> f64 {
    let mut x = radians % TWO_PI;
    if x < 0.0 {
        x += TWO_PI;
    }
    // -1e-17 % 2π + 2π rounds to exactly 2π
    if x >= TWO_PI {
        x -= TWO_PI;
    }
    x
}

/// Signed smallest rotation from `from` to `to`, in `(-π, π]`.
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    let mut delta = normalize_positive(to) - normalize_positive(from);
    if delta > PI {
        delta -= TWO_PI;
    } else if delta <= -PI {
        delta += TWO_PI;
    }
    delta
}

/// Unsigned angular distance in `[0, π]`.
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let d = libm::fabs(normalize_positive(a) - normalize_positive(b));
    if d > PI {
        TWO_PI - d
    } else {
        d
    }
}

/// Saturates `value` to `[min, max]`. Callers guarantee `min <= max`.
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
