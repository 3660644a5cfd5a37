//! Initial orientation and spin

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::is_close;
use crate::sim::distribution::{
    DistributionTable, ValueFloat, calc_distribution_tick_value, update_distribution_ptr,
};
use crate::sim::info::SpawnInfo;
use crate::sim::particle::Particle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRotation {
    /// Initial angle around `init_axis` (degrees)
    pub init_angle: ValueFloat,
    pub init_axis: Vec3,
    /// Angular speed around `rotate_axis`
    pub rotate_speed: ValueFloat,
    pub rotate_axis: Vec3,
}

impl Default for SpawnRotation {
    fn default() -> Self {
        Self {
            init_angle: ValueFloat::constant(0.0),
            init_axis: Vec3::Z,
            rotate_speed: ValueFloat::constant(0.0),
            rotate_axis: Vec3::Z,
        }
    }
}

impl SpawnRotation {
    pub fn execute(&self, info: &SpawnInfo<'_>, particle: &mut Particle) {
        particle.angular_vel = calc_distribution_tick_value(&self.rotate_speed, &info.base, particle);
        let angle = calc_distribution_tick_value(&self.init_angle, &info.base, particle).to_radians();

        // An axis within 0.001 of zero is passed through as-is
        let init_axis = if is_close(self.init_axis, Vec3::ZERO) {
            self.init_axis
        } else {
            self.init_axis.normalize()
        };
        let rotate_axis = if is_close(self.rotate_axis, Vec3::ZERO) {
            self.rotate_axis
        } else {
            self.rotate_axis.normalize()
        };

        particle.rotation = init_axis.extend(angle);
        particle.rotation_vector = rotate_axis.extend(0.0);
    }

    pub fn update_dist_ptr(&mut self, table: &DistributionTable) {
        update_distribution_ptr(&mut self.init_angle, table);
        update_distribution_ptr(&mut self.rotate_speed, table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::info::RandomStream;
    use glam::Vec4;

    #[test]
    fn test_rotation_normalizes_axes() {
        let random = RandomStream::new(1);
        let info = SpawnInfo::new(&random);
        let kernel = SpawnRotation {
            init_angle: ValueFloat::constant(90.0),
            init_axis: Vec3::new(0.0, 0.0, 3.0),
            rotate_speed: ValueFloat::constant(45.0),
            rotate_axis: Vec3::new(2.0, 0.0, 0.0),
        };
        let mut p = Particle::default();
        kernel.execute(&info, &mut p);

        assert_eq!(p.angular_vel, 45.0);
        assert!(p.rotation.abs_diff_eq(Vec4::new(0.0, 0.0, 1.0, std::f32::consts::FRAC_PI_2), 1e-6));
        assert_eq!(p.rotation_vector, Vec4::new(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotation_zero_axis_passthrough() {
        let random = RandomStream::new(1);
        let info = SpawnInfo::new(&random);
        let kernel = SpawnRotation {
            init_angle: ValueFloat::constant(180.0),
            init_axis: Vec3::ZERO,
            rotate_axis: Vec3::ZERO,
            ..Default::default()
        };
        let mut p = Particle::default();
        kernel.execute(&info, &mut p);

        assert_eq!(p.rotation.truncate(), Vec3::ZERO);
        assert!((p.rotation.w - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(p.rotation_vector, Vec4::ZERO);
        assert!(!p.rotation.is_nan());
    }

    #[test]
    fn test_rotation_tiny_axis_passthrough() {
        let random = RandomStream::new(1);
        let info = SpawnInfo::new(&random);
        let tiny = Vec3::new(5.0e-4, 0.0, 0.0);
        let kernel = SpawnRotation {
            init_axis: tiny,
            rotate_axis: tiny,
            ..Default::default()
        };
        let mut p = Particle::default();
        kernel.execute(&info, &mut p);

        assert_eq!(p.rotation.truncate(), tiny);
        assert_eq!(p.rotation_vector, tiny.extend(0.0));

        // Just outside the tolerance: normalized
        let kernel = SpawnRotation {
            init_axis: Vec3::new(2.0e-3, 0.0, 0.0),
            ..Default::default()
        };
        kernel.execute(&info, &mut p);
        assert_eq!(p.rotation.truncate(), Vec3::X);
    }
}
