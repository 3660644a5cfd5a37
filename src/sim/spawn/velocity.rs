//! Initial velocity kernels
//!
//! Angles in the parameter structs are degrees; strengths are sampled once
//! per spawned particle.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::consts::{ALMOST_ONE, FLOAT_EPSILON};
use crate::math::cone_direction;
use crate::sim::distribution::{
    DistributionTable, ValueFloat, ValueVec3, calc_distribution_tick_value,
    update_distribution_ptr,
};
use crate::sim::info::SpawnInfo;
use crate::sim::particle::Particle;
use crate::{is_close, is_near_zero};

/// velocity = strength × direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnVelDirection {
    pub strength: ValueFloat,
    pub direction: ValueVec3,
}

impl Default for SpawnVelDirection {
    fn default() -> Self {
        Self {
            strength: ValueFloat::constant(1.0),
            direction: ValueVec3::constant(Vec3::Z),
        }
    }
}

impl SpawnVelDirection {
    pub fn execute(&self, info: &SpawnInfo<'_>, particle: &mut Particle) {
        let strength = calc_distribution_tick_value(&self.strength, &info.base, particle);
        let direction = calc_distribution_tick_value(&self.direction, &info.base, particle);
        particle.velocity = strength * direction;
    }

    pub fn update_dist_ptr(&mut self, table: &DistributionTable) {
        update_distribution_ptr(&mut self.strength, table);
        update_distribution_ptr(&mut self.direction, table);
    }
}

/// Fan of directions in the plane containing `direction`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnVelSector {
    pub strength: ValueFloat,
    /// Centre line of the fan
    pub direction: Vec3,
    /// Full opening of the fan (degrees)
    pub central_angle: f32,
    /// Spin of the fan plane around `direction` (degrees)
    pub rotate_angle: f32,
}

impl Default for SpawnVelSector {
    fn default() -> Self {
        Self {
            strength: ValueFloat::constant(1.0),
            direction: Vec3::Z,
            central_angle: 90.0,
            rotate_angle: 0.0,
        }
    }
}

impl SpawnVelSector {
    pub fn execute(&self, info: &SpawnInfo<'_>, particle: &mut Particle) {
        let direction = self.direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            particle.velocity = Vec3::ZERO;
            return;
        }

        // Fan plane normal: X unless the centre line lies exactly along it
        let reference = if (direction.dot(Vec3::X).abs() - 1.0).abs() <= FLOAT_EPSILON {
            Vec3::Y
        } else {
            Vec3::X
        };
        let normal = direction.cross(reference).normalize();

        // In-plane zero-angle line, derived from the emitter's up axis
        let axis_up = if is_close(info.front, Vec3::Z) {
            Vec3::Y
        } else {
            Vec3::Z
        };
        let mut norm_up = axis_up.normalize();
        if normal.dot(norm_up).abs() > ALMOST_ONE {
            norm_up = Vec3::new(norm_up.z, norm_up.x, norm_up.y);
        }
        let right = normal.cross(norm_up).normalize();
        let front = right.cross(normal).normalize();

        let mut to_direction = front.cross(direction).dot(normal).atan2(front.dot(direction));
        if to_direction < 0.0 {
            to_direction += TAU;
        }

        let central = self.central_angle.to_radians();
        let theta = central * info.rand();
        let angle = to_direction - central / 2.0 + theta;
        let mut spawn_direction = Quat::from_axis_angle(normal, angle) * front;

        if self.rotate_angle.abs() > 0.0 {
            spawn_direction =
                Quat::from_axis_angle(direction, self.rotate_angle.to_radians()) * spawn_direction;
        }

        particle.velocity =
            spawn_direction * calc_distribution_tick_value(&self.strength, &info.base, particle);
    }

    pub fn update_dist_ptr(&mut self, table: &DistributionTable) {
        update_distribution_ptr(&mut self.strength, table);
    }
}

/// Uniform azimuth inside a cone around `direction`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnVelCone {
    pub strength: ValueFloat,
    pub direction: Vec3,
    /// Full aperture (degrees)
    pub angle: f32,
}

impl Default for SpawnVelCone {
    fn default() -> Self {
        Self {
            strength: ValueFloat::constant(1.0),
            direction: Vec3::Z,
            angle: 30.0,
        }
    }
}

impl SpawnVelCone {
    pub fn execute(&self, info: &SpawnInfo<'_>, particle: &mut Particle) {
        if is_near_zero(self.direction) {
            particle.velocity = Vec3::ZERO;
            return;
        }
        let half_angle = self.angle.to_radians() / 2.0;
        let spawn_direction = cone_direction(self.direction, half_angle, info.rand(), info.rand());
        particle.velocity =
            spawn_direction * calc_distribution_tick_value(&self.strength, &info.base, particle);
    }

    pub fn update_dist_ptr(&mut self, table: &DistributionTable) {
        update_distribution_ptr(&mut self.strength, table);
    }
}

/// Any direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnVelSphere {
    pub strength: ValueFloat,
}

impl Default for SpawnVelSphere {
    fn default() -> Self {
        Self {
            strength: ValueFloat::constant(1.0),
        }
    }
}

impl SpawnVelSphere {
    pub fn execute(&self, info: &SpawnInfo<'_>, particle: &mut Particle) {
        let th = TAU * info.rand();
        let ap = PI * info.rand();
        let (sin_ap, cos_ap) = ap.sin_cos();
        let direction = Vec3::new(th.cos() * sin_ap, cos_ap, th.sin() * sin_ap);
        particle.velocity =
            direction * calc_distribution_tick_value(&self.strength, &info.base, particle);
    }

    pub fn update_dist_ptr(&mut self, table: &DistributionTable) {
        update_distribution_ptr(&mut self.strength, table);
    }
}

/// Head for a fixed point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnVelConcentrate {
    pub rate: ValueFloat,
    pub centre: Vec3,
}

impl Default for SpawnVelConcentrate {
    fn default() -> Self {
        Self {
            rate: ValueFloat::constant(1.0),
            centre: Vec3::ZERO,
        }
    }
}

impl SpawnVelConcentrate {
    pub fn execute(&self, info: &SpawnInfo<'_>, particle: &mut Particle) {
        let direction = self.centre - particle.local_position;
        let length = direction.length();
        if length > 0.0 {
            particle.velocity =
                direction / length * calc_distribution_tick_value(&self.rate, &info.base, particle);
        }
    }

    pub fn update_dist_ptr(&mut self, table: &DistributionTable) {
        update_distribution_ptr(&mut self.rate, table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::distribution::{DistRef, RandomDistribution};
    use crate::sim::info::RandomStream;

    #[test]
    fn test_direction_scales_vector() {
        let random = RandomStream::new(1);
        let info = SpawnInfo::new(&random);
        let kernel = SpawnVelDirection {
            strength: ValueFloat::constant(3.0),
            direction: ValueVec3::constant(Vec3::new(0.0, 1.0, 2.0)),
        };
        let mut p = Particle::default();
        kernel.execute(&info, &mut p);
        assert_eq!(p.velocity, Vec3::new(0.0, 3.0, 6.0));
    }

    #[test]
    fn test_direction_rebind_enables_distribution() {
        let random = RandomStream::new(1);
        let info = SpawnInfo::new(&random);
        let table = DistributionTable {
            randoms: vec![RandomDistribution { min: 5.0, max: 6.0 }],
            curves: Vec::new(),
        };
        let mut kernel = SpawnVelDirection {
            strength: ValueFloat::distributed(1.0, DistRef::random(0)),
            direction: ValueVec3::constant(Vec3::X),
        };
        kernel.update_dist_ptr(&table);

        let mut p = Particle::default();
        kernel.execute(&info, &mut p);
        assert!((5.0..6.0).contains(&p.velocity.x));
    }

    #[test]
    fn test_sector_stays_in_fan() {
        let random = RandomStream::new(3);
        let info = SpawnInfo::new(&random);
        for direction in [Vec3::Z, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.2, -0.7, 0.4)] {
            let kernel = SpawnVelSector {
                strength: ValueFloat::constant(2.0),
                direction,
                central_angle: 60.0,
                rotate_angle: 0.0,
            };
            let dir = direction.normalize();
            for _ in 0..200 {
                let mut p = Particle::default();
                kernel.execute(&info, &mut p);
                assert!((p.velocity.length() - 2.0).abs() < 1e-4);
                let angle = p.velocity.normalize().dot(dir).clamp(-1.0, 1.0).acos();
                assert!(angle <= 30f32.to_radians() + 1e-3, "{direction:?}: {angle}");
            }
        }
    }

    #[test]
    fn test_sector_near_x_keeps_x_reference() {
        // Two degrees off X: the fan plane normal is direction × X = -Z,
        // so sample u lands at (central/2 - central·u) around +Z from the centre
        let direction = Vec3::new(1.0, 2f32.to_radians().tan(), 0.0);
        let kernel = SpawnVelSector {
            direction,
            central_angle: 60.0,
            ..Default::default()
        };
        let dir = direction.normalize();
        for seed in 0..20 {
            let u = RandomStream::new(seed).rand();
            let random = RandomStream::new(seed);
            let info = SpawnInfo::new(&random);
            let mut p = Particle::default();
            kernel.execute(&info, &mut p);

            let v = p.velocity.normalize();
            let signed = dir.cross(v).z.atan2(dir.dot(v));
            let expected = 30f32.to_radians() - 60f32.to_radians() * u;
            assert!((signed - expected).abs() < 1e-3, "seed {seed}: {signed} vs {expected}");
        }
    }

    #[test]
    fn test_sector_is_planar() {
        let random = RandomStream::new(11);
        let info = SpawnInfo::new(&random);
        let kernel = SpawnVelSector {
            direction: Vec3::Y,
            central_angle: 120.0,
            ..Default::default()
        };
        let mut samples = Vec::new();
        for _ in 0..50 {
            let mut p = Particle::default();
            kernel.execute(&info, &mut p);
            samples.push(p.velocity);
        }
        // All samples share the plane spanned by the first two
        let normal = samples[0].cross(samples[1]).normalize();
        for v in &samples {
            assert!(v.dot(normal).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sector_zero_direction() {
        let random = RandomStream::new(3);
        let info = SpawnInfo::new(&random);
        let kernel = SpawnVelSector {
            direction: Vec3::ZERO,
            ..Default::default()
        };
        let mut p = Particle::default();
        p.velocity = Vec3::ONE;
        kernel.execute(&info, &mut p);
        assert_eq!(p.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_cone_within_half_angle() {
        let random = RandomStream::new(5);
        let info = SpawnInfo::new(&random);
        let direction = Vec3::new(1.0, -2.0, 0.5);
        let kernel = SpawnVelCone {
            strength: ValueFloat::constant(4.0),
            direction,
            angle: 40.0,
        };
        for _ in 0..500 {
            let mut p = Particle::default();
            kernel.execute(&info, &mut p);
            assert!((p.velocity.length() - 4.0).abs() < 1e-4);
            let angle = p.velocity.normalize().dot(direction.normalize()).clamp(-1.0, 1.0).acos();
            assert!(angle <= 20f32.to_radians() + 1e-3);
        }
    }

    #[test]
    fn test_sphere_unbiased() {
        let random = RandomStream::new(2024);
        let info = SpawnInfo::new(&random);
        let kernel = SpawnVelSphere::default();

        let n = 10_000;
        let mut sum = Vec3::ZERO;
        let mut magnitude = 0.0;
        for _ in 0..n {
            let mut p = Particle::default();
            kernel.execute(&info, &mut p);
            sum += p.velocity;
            magnitude += p.velocity.length();
        }
        let mean = sum / n as f32;
        assert!((magnitude / n as f32 - 1.0).abs() < 1e-4);
        assert!(mean.length() < 0.05, "directional bias {mean:?}");
    }

    #[test]
    fn test_concentrate() {
        let random = RandomStream::new(1);
        let info = SpawnInfo::new(&random);
        let kernel = SpawnVelConcentrate {
            rate: ValueFloat::constant(2.0),
            centre: Vec3::new(0.0, 0.0, 10.0),
        };

        let mut p = Particle::at(Vec3::new(0.0, 0.0, 4.0));
        kernel.execute(&info, &mut p);
        assert!(p.velocity.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));

        // Already at the centre: untouched
        let mut p = Particle::at(Vec3::new(0.0, 0.0, 10.0));
        p.velocity = Vec3::X;
        kernel.execute(&info, &mut p);
        assert_eq!(p.velocity, Vec3::X);
    }
}
