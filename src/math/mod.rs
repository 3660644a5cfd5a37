//! Vector helpers shared by the kernels
//!
//! Conventions: Z-up, right-handed, and a look-at basis whose local +Y is
//! the "forward" axis.

pub mod noise;

use glam::{Mat3, Vec3};
use std::f32::consts::TAU;

pub use noise::SimplexNoise;

use crate::consts::ALMOST_ONE;

/// Rotation whose local +Y axis points along `forward`.
///
/// Columns are `(right, forward, up)`. When `forward` is (nearly) parallel to
/// world Z the up reference falls back to world Y. Returns identity for a
/// zero `forward`.
pub fn look_at_basis(forward: Vec3) -> Mat3 {
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Mat3::IDENTITY;
    }

    let mut up = Vec3::Z;
    if forward.dot(up).abs() > ALMOST_ONE {
        up = Vec3::Y;
    }
    let right = forward.cross(up).normalize();
    let up = right.cross(forward).normalize();
    Mat3::from_cols(right, forward, up)
}

/// Direction drawn from a cone around `axis`.
///
/// `u_theta` and `u_phi` are uniform samples in [0, 1); the azimuth is
/// `u_theta * 2π` and the polar angle from the axis is `u_phi * half_angle`.
pub fn cone_direction(axis: Vec3, half_angle: f32, u_theta: f32, u_phi: f32) -> Vec3 {
    let theta = TAU * u_theta;
    let phi = half_angle * u_phi;
    let (sin_phi, cos_phi) = phi.sin_cos();
    let local = Vec3::new(theta.cos() * sin_phi, cos_phi, theta.sin() * sin_phi);
    look_at_basis(axis) * local
}

/// Reflect `v` about a surface with unit normal `n`: v' = v - 2(v·n)n
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}
