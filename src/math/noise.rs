//! 3-D simplex noise with an analytic gradient
//!
//! The lattice is the usual skewed tetrahedral one (skew 1/3, unskew 1/6).
//! Corner gradients come from an integer PCG-style hash, so every sample is a
//! pure function of its input point.

use glam::{Vec3, Vec4};

const SKEW_3D: f32 = 1.0 / 3.0;
const UNSKEW_3D: f32 = 1.0 / 6.0;

/// Kernel normalisation so the noise spans roughly [-1, 1]
const SMOOTH_SCALE: f32 = 1024.0 / 375.0;

const LCG_MUL: u32 = 1_664_525;
const LCG_INC: u32 = 1_013_904_223;

const GRADIENT_MASK: [u32; 3] = [0x8000, 0x4000, 0x2000];
const GRADIENT_SCALE: Vec3 = Vec3::new(1.0 / 0x4000 as f32, 1.0 / 0x2000 as f32, 1.0 / 0x1000 as f32);

/// Stateless simplex noise sampler
pub struct SimplexNoise;

impl SimplexNoise {
    /// The four corners of the simplex containing `input`, in input space.
    ///
    /// Order: cell origin, first and second intermediate corners, opposite corner.
    pub fn sample_simplex_noise(input: Vec3) -> [Vec3; 4] {
        let cell_skew = (input + Vec3::splat(input.dot(Vec3::splat(SKEW_3D)))).floor();
        let cell = cell_skew - Vec3::splat(cell_skew.dot(Vec3::splat(UNSKEW_3D)));
        let offset = input - cell;

        // Traversal order from pairwise comparisons of the offset components
        let order1 = Vec3::new(
            step(offset.y, offset.x),
            step(offset.z, offset.y),
            step(offset.x, offset.z),
        );
        let order2 = Vec3::new(
            step(offset.z, offset.x),
            step(offset.x, offset.y),
            step(offset.y, offset.z),
        );

        let offset1 = order1.min(order2) - Vec3::splat(UNSKEW_3D);
        let offset2 = order1.max(order2) - Vec3::splat(2.0 * UNSKEW_3D);
        let offset3 = Vec3::splat(1.0 - 3.0 * UNSKEW_3D);

        [cell, cell + offset1, cell + offset2, cell + offset3]
    }

    /// Three noise channels at `input`.
    ///
    /// Each returned vector holds the channel's gradient in `xyz` and its
    /// value in `w`. Channel 0 takes its corner gradients from the hash as
    /// `(x, y, z)`; channels 1 and 2 use the rotations `(y, z, x)` and
    /// `(z, x, y)`.
    pub fn jacobian_simplex_noise(input: Vec3) -> [Vec4; 3] {
        let corners = Self::sample_simplex_noise(input);

        let mut offsets = [Vec3::ZERO; 4];
        // gvec[channel][corner]
        let mut gvec = [[Vec3::ZERO; 4]; 3];
        // grad[channel][corner] = gradient · offset
        let mut grad = [[0.0f32; 4]; 3];

        for (i, corner) in corners.iter().enumerate() {
            offsets[i] = input - *corner;
            let rand = Self::random_pcg16(6.0 * *corner + Vec3::splat(0.5));
            let bits = [rand.x as u32, rand.y as u32, rand.z as u32];

            // Axis k of channel c reads hash component (c + k) % 3 under mask k
            for channel in 0..3 {
                let masked = Vec3::new(
                    (bits[channel] & GRADIENT_MASK[0]) as f32,
                    (bits[(channel + 1) % 3] & GRADIENT_MASK[1]) as f32,
                    (bits[(channel + 2) % 3] & GRADIENT_MASK[2]) as f32,
                );
                let g = masked * GRADIENT_SCALE - Vec3::ONE;
                gvec[channel][i] = g;
                grad[channel][i] = g.dot(offsets[i]);
            }
        }

        let smooth = Self::simplex_smooth(&offsets);
        let dsmooth = Self::simplex_dsmooth(&offsets);
        let smooth_arr = smooth.to_array();

        let mut out = [Vec4::ZERO; 3];
        for channel in 0..3 {
            let g = Vec4::from_array(grad[channel]);
            let mut gradient = Vec3::ZERO;
            for (i, s) in smooth_arr.iter().enumerate() {
                gradient += *s * gvec[channel][i];
            }
            gradient += Vec3::new(dsmooth[0].dot(g), dsmooth[1].dot(g), dsmooth[2].dot(g));
            out[channel] = gradient.extend(smooth.dot(g));
        }
        out
    }

    /// Integer hash of a lattice point, 16 bits per component returned as floats.
    pub fn random_pcg16(vec: Vec3) -> Vec3 {
        let seed = |v: f32| (v as i32 as u32).wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        let mut x = seed(vec.x);
        let mut y = seed(vec.y);
        let mut z = seed(vec.z);

        for _ in 0..2 {
            x = x.wrapping_add(y.wrapping_mul(z));
            y = y.wrapping_add(z.wrapping_mul(x));
            z = z.wrapping_add(x.wrapping_mul(y));
        }

        Vec3::new((x >> 16) as f32, (y >> 16) as f32, (z >> 16) as f32)
    }

    /// Radial falloff per corner: scale · (1 - s)³ with s = clamp(2|offset|², 0, 1)
    pub fn simplex_smooth(offsets: &[Vec3; 4]) -> Vec4 {
        let s = falloff_input(offsets);
        SMOOTH_SCALE * (Vec4::ONE + s * (Vec4::splat(-3.0) + s * (Vec4::splat(3.0) - s)))
    }

    /// Derivative of `simplex_smooth`, one row per axis (x, y, z), one lane per corner
    pub fn simplex_dsmooth(offsets: &[Vec3; 4]) -> [Vec4; 3] {
        let s = falloff_input(offsets);
        let s = SMOOTH_SCALE * (Vec4::splat(-12.0) + s * (Vec4::splat(24.0) - 12.0 * s));
        [
            s * Vec4::new(offsets[0].x, offsets[1].x, offsets[2].x, offsets[3].x),
            s * Vec4::new(offsets[0].y, offsets[1].y, offsets[2].y, offsets[3].y),
            s * Vec4::new(offsets[0].z, offsets[1].z, offsets[2].z, offsets[3].z),
        ]
    }
}

/// 1.0 when `edge <= x`, else 0.0
#[inline]
fn step(edge: f32, x: f32) -> f32 {
    if edge <= x { 1.0 } else { 0.0 }
}

#[inline]
fn falloff_input(offsets: &[Vec3; 4]) -> Vec4 {
    let d = Vec4::new(
        offsets[0].length_squared(),
        offsets[1].length_squared(),
        offsets[2].length_squared(),
        offsets[3].length_squared(),
    );
    (2.0 * d).clamp(Vec4::ZERO, Vec4::ONE)
}
