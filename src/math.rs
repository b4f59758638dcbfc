//! Small view-math helpers shared by the camera variants.

use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::TAU;

/// Decay base for the viewport's damped interpolation: per elapsed second,
/// the remaining error shrinks by a factor of 500.
pub const DAMP_BASE: f32 = 500.0;

/// Fraction of the remaining error consumed after `dt` seconds of damping.
pub fn damp_frac(dt: f32) -> f32 {
    1.0 - DAMP_BASE.powf(-dt)
}

/// Critically-damped step of `cur` toward `goal` over `dt` seconds.
pub fn approach(cur: f32, goal: f32, dt: f32) -> f32 {
    cur + (goal - cur) * damp_frac(dt)
}

/// Normalize an angle into [0, 2π).
pub fn norm_tau(a: f32) -> f32 {
    let r = a.rem_euclid(TAU);
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Normalize an angle into (-π, π].
pub fn cangle(a: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut a = a;
    while a > PI {
        a -= TAU;
    }
    while a < -PI {
        a += TAU;
    }
    a
}

/// Off-center perspective frustum (GL clip conventions); glam has no direct
/// equivalent for asymmetric near-plane bounds.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(2.0 * near / (right - left), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / (top - bottom), 0.0, 0.0),
        Vec4::new(
            (right + left) / (right - left),
            (top + bottom) / (top - bottom),
            -(far + near) / (far - near),
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / (far - near), 0.0),
    )
}

/// View matrix for an eye orbiting `base` at `dist`, elevated `elev` above
/// the map plane, azimuth `angl`. The world is z-up.
pub fn pointed(base: Vec3, dist: f32, elev: f32, angl: f32) -> Mat4 {
    let eye = base
        + Vec3::new(
            angl.cos() * elev.cos(),
            angl.sin() * elev.cos(),
            elev.sin(),
        ) * dist;
    Mat4::look_at_rh(eye, base, Vec3::Z)
}
