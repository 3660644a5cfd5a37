//! The per-particle record the kernels mutate

use glam::{Affine3A, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A single simulated particle.
///
/// Owned by the driver's particle array; kernels only ever see `&mut Particle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Position in simulation space (emitter-local or spawn-local)
    pub local_position: Vec3,
    pub velocity: Vec3,
    /// Axis-angle: unit axis in `xyz`, angle in radians in `w`
    pub rotation: Vec4,
    /// Spin axis in `xyz`
    pub rotation_vector: Vec4,
    /// Spin rate around `rotation_vector`
    pub angular_vel: f32,
    pub scale: Vec3,
    /// Local-to-world transform captured at spawn
    pub spawn_trans: Affine3A,
    /// Total lifetime (seconds)
    pub lifetime: f32,
    /// Age (seconds since spawn)
    pub current_life: f32,
    /// Set by the collision kernel on the tick a contact happens
    pub is_collided: bool,
    /// World-space contact point of the last collision
    pub collision_position: Vec3,
    /// Time left in the tick after the last contact
    pub collision_time_before_tick: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            local_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Vec4::ZERO,
            rotation_vector: Vec4::ZERO,
            angular_vel: 0.0,
            scale: Vec3::ONE,
            spawn_trans: Affine3A::IDENTITY,
            lifetime: 1.0,
            current_life: 0.0,
            is_collided: false,
            collision_position: Vec3::ZERO,
            collision_time_before_tick: 0.0,
        }
    }
}

impl Particle {
    /// Particle at `position` with default everything else
    pub fn at(position: Vec3) -> Self {
        Self {
            local_position: position,
            ..Default::default()
        }
    }

    /// Normalized age in [0, 1]
    pub fn life_percent(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 1.0;
        }
        (self.current_life / self.lifetime).clamp(0.0, 1.0)
    }

    /// Whether the particle has outlived its lifetime
    pub fn is_dead(&self) -> bool {
        self.current_life >= self.lifetime
    }

    /// Explicit Euler step
    pub fn integrate(&mut self, dt: f32) {
        self.local_position += self.velocity * dt;
        self.current_life += dt;
    }

    /// World-space position given the simulation mode
    pub fn world_position(&self, local_space: bool, emitter_trans: &Affine3A) -> Vec3 {
        if local_space {
            emitter_trans.transform_point3(self.local_position)
        } else {
            self.spawn_trans.transform_point3(self.local_position)
        }
    }
}
