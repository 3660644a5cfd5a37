//! Plane collision detection and bounce response
//!
//! Each configured plane is treated as a slab of half-width `radius` (the
//! particle's collision radius). Per tick and per plane:
//! - start outside and stay on the same side: nothing happens
//! - start inside the slab: snap to the face the particle is on; bounce only
//!   if it is still moving into the plane
//! - cross the slab face during the tick: record the contact and bounce
//!
//! With two planes the second sees the particle as the first left it.

use glam::{Affine3A, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::consts::FLOAT_EPSILON;
use crate::math::{cone_direction, reflect};
use crate::sim::info::UpdateInfo;
use crate::sim::particle::Particle;
use crate::{is_close, is_near_zero};

/// Infinite plane through `position` facing `normal`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionPlane {
    pub normal: Vec3,
    pub position: Vec3,
}

impl Default for CollisionPlane {
    fn default() -> Self {
        Self {
            normal: Vec3::Z,
            position: Vec3::ZERO,
        }
    }
}

impl CollisionPlane {
    pub fn new(normal: Vec3, position: Vec3) -> Self {
        Self { normal, position }
    }

    /// Same plane with a unit normal, or `None` for a degenerate normal
    pub fn normalized(&self) -> Option<Self> {
        if is_near_zero(self.normal) {
            return None;
        }
        Some(Self {
            normal: self.normal.normalize(),
            position: self.position,
        })
    }

    /// This plane expressed in the space `to_local` maps into
    pub fn transformed(&self, to_local: &Affine3A) -> Option<Self> {
        Self {
            normal: to_local.transform_vector3(self.normal),
            position: to_local.transform_point3(self.position),
        }
        .normalized()
    }

    /// Signed distance of `point` from the plane
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point - self.position)
    }
}

/// Where the collision radius comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RadiusCalculationType {
    /// Billboard size (the two scale axes facing the camera)
    #[default]
    Sprite,
    /// Mesh scale or AABB
    Mesh,
    /// Fixed `radius`
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RadiusCalculationMethod {
    /// Half the diagonal of the bounds
    #[default]
    Bounds,
    MaximumAxis,
    MinimumAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionRadius {
    #[serde(rename = "type")]
    pub kind: RadiusCalculationType,
    pub method: RadiusCalculationMethod,
    /// Used by `Custom` only
    pub radius: f32,
    pub radius_scale: f32,
}

impl Default for CollisionRadius {
    fn default() -> Self {
        Self {
            kind: RadiusCalculationType::Sprite,
            method: RadiusCalculationMethod::Bounds,
            radius: 1.0,
            radius_scale: 1.0,
        }
    }
}

impl CollisionRadius {
    /// Fixed radius, no scaling
    pub fn custom(radius: f32) -> Self {
        Self {
            kind: RadiusCalculationType::Custom,
            radius,
            ..Default::default()
        }
    }

    pub fn calculate(&self, particle: &Particle, info: &UpdateInfo<'_>) -> f32 {
        match self.kind {
            RadiusCalculationType::Mesh => self.mesh_radius(particle, info),
            RadiusCalculationType::Custom => self.radius * self.radius_scale,
            RadiusCalculationType::Sprite => self.sprite_radius(particle, info),
        }
    }

    fn sprite_radius(&self, particle: &Particle, info: &UpdateInfo<'_>) -> f32 {
        let scale = particle.scale;
        let size = if is_close(info.front, Vec3::Z) || is_close(info.front, Vec3::NEG_Z) {
            Vec2::new(scale.x, scale.y)
        } else if is_close(info.front, Vec3::Y) || is_close(info.front, Vec3::NEG_Y) {
            Vec2::new(scale.x, scale.z)
        } else {
            Vec2::new(scale.y, scale.z)
        };

        match self.method {
            RadiusCalculationMethod::MaximumAxis => self.radius_scale * size.max_element() / 2.0,
            RadiusCalculationMethod::MinimumAxis => self.radius_scale * size.min_element() / 2.0,
            RadiusCalculationMethod::Bounds => self.radius_scale * size.length() / 2.0,
        }
    }

    fn mesh_radius(&self, particle: &Particle, info: &UpdateInfo<'_>) -> f32 {
        match self.method {
            RadiusCalculationMethod::MaximumAxis => {
                self.radius_scale * particle.scale.max_element() / 2.0
            }
            RadiusCalculationMethod::MinimumAxis => {
                self.radius_scale * particle.scale.min_element() / 2.0
            }
            RadiusCalculationMethod::Bounds => {
                bound_radius(info.max_extend, info.min_extend, particle.scale) * self.radius_scale
            }
        }
    }
}

/// Distance from the centre to a corner of the scaled [min, max] box
fn bound_radius(max: Vec3, min: Vec3, particle_size: Vec3) -> f32 {
    let max_extend = max * particle_size;
    let min_extend = min * particle_size;
    let center = (max_extend + min_extend) * 0.5;
    (max_extend - center).length()
}

/// Bounce response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounce {
    /// Fraction of speed kept after a bounce
    pub restitution: f32,
    /// 0 = exact mirror, 1 = normal jittered by up to 90°
    pub randomize_normal: f32,
}

impl Default for Bounce {
    fn default() -> Self {
        Self {
            restitution: 1.0,
            randomize_normal: 0.0,
        }
    }
}

/// Collide particles against one or two planes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParticleCollision {
    pub bounce: Bounce,
    #[serde(default)]
    pub use_two_plane: bool,
    pub collision_plane1: CollisionPlane,
    #[serde(default)]
    pub collision_plane2: CollisionPlane,
    #[serde(default)]
    pub collision_radius: CollisionRadius,
}

/// Per-plane working state for one tick
#[derive(Debug, Clone, Copy)]
struct CollisionParam {
    local_plane: CollisionPlane,
    radius: f32,
    last_dot_plane: f32,
    new_dot_plane: f32,
}

impl ParticleCollision {
    pub fn execute(&self, info: &UpdateInfo<'_>, particle: &mut Particle) {
        let radius = self.collision_radius.calculate(particle, info);
        let second = self.use_two_plane.then_some(self.collision_plane2);

        for plane in std::iter::once(self.collision_plane1).chain(second) {
            let local_plane = if info.local_space {
                plane.normalized()
            } else {
                plane.transformed(&particle.spawn_trans.inverse())
            };
            let Some(local_plane) = local_plane else {
                continue;
            };

            let next_position = particle.local_position + particle.velocity * info.tick_time;
            let param = CollisionParam {
                local_plane,
                radius,
                last_dot_plane: local_plane.signed_distance(particle.local_position),
                new_dot_plane: local_plane.signed_distance(next_position),
            };
            self.handle_collision(particle, info, &param);
        }
    }

    fn handle_collision(&self, particle: &mut Particle, info: &UpdateInfo<'_>, param: &CollisionParam) {
        let plane_normal = param.local_plane.normal;
        let radius = param.radius;

        let distance = if param.last_dot_plane >= radius {
            // In front of the slab
            if param.new_dot_plane >= radius {
                return;
            }
            param.last_dot_plane - radius
        } else if param.last_dot_plane <= -radius {
            // Behind the slab
            if param.new_dot_plane <= -radius {
                return;
            }
            param.last_dot_plane + radius
        } else if param.last_dot_plane < 0.0 {
            // Inside, back half: snap to the back face
            let depth = param.last_dot_plane + radius;
            particle.local_position -= depth * plane_normal;
            if particle.velocity.dot(plane_normal) < 0.0 {
                return;
            }
            0.0
        } else {
            // Inside, front half: snap to the front face
            let depth = param.last_dot_plane - radius;
            particle.local_position -= depth * plane_normal;
            if particle.velocity.dot(plane_normal) > 0.0 {
                return;
            }
            0.0
        };

        let v_dot_n = particle.velocity.dot(plane_normal);
        let time = if v_dot_n.abs() > FLOAT_EPSILON {
            (distance / v_dot_n).abs()
        } else {
            0.0
        };

        let contact = particle.local_position + particle.velocity * time;
        particle.collision_position = if info.local_space {
            info.emitter_trans.transform_point3(contact)
        } else {
            particle.spawn_trans.transform_point3(contact)
        };
        particle.is_collided = true;
        particle.collision_time_before_tick = info.tick_time - time;

        let normal = if self.bounce.randomize_normal <= FLOAT_EPSILON {
            particle.local_position -= 2.0 * distance * plane_normal;
            plane_normal
        } else {
            randomized_normal(plane_normal, info, self.bounce.randomize_normal)
        };

        particle.velocity = reflect(particle.velocity, normal) * self.bounce.restitution;
    }
}

/// Normal jittered inside a cone of half-angle `π/2 · coefficient`
fn randomized_normal(plane_normal: Vec3, info: &UpdateInfo<'_>, coefficient: f32) -> Vec3 {
    let half_angle = PI * coefficient / 2.0;
    cone_direction(plane_normal, half_angle, info.rand(), info.rand()).normalize_or(plane_normal)
}
