//! Emitter configuration
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::SIM_DT;
use crate::is_near_zero;
use crate::sim::collision::{Bounce, CollisionPlane, CollisionRadius, ParticleCollision};
use crate::sim::distribution::{DistRef, DistributionTable, RandomDistribution, ValueFloat};
use crate::sim::module::{ModuleStack, SpawnModule, UpdateModule};
use crate::sim::spawn::{SpawnRotation, SpawnVelSphere};

/// Errors raised while loading or validating a config
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON or wrong field types
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Parsed, but the values make no sense
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// One emitter: simulation settings, distributions and modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Random stream seed
    pub seed: u64,
    /// Fixed step (seconds)
    pub tick_time: f32,
    /// Number of ticks the demo driver runs
    pub ticks: u32,
    /// Particles spawned at t = 0
    pub particle_count: u32,
    /// Lifetime of each particle (seconds)
    pub lifetime: f32,
    /// Simulate in emitter space (`true`) or spawn space
    pub local_space: bool,
    /// Sprite facing axis
    pub front: Vec3,
    /// Emitter origin in world space
    pub emitter_position: Vec3,
    /// Mesh AABB at unit scale
    pub max_extend: Vec3,
    pub min_extend: Vec3,
    pub distributions: DistributionTable,
    pub modules: ModuleStack,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_time: SIM_DT,
            ticks: 240,
            particle_count: 256,
            lifetime: 4.0,
            local_space: true,
            front: Vec3::NEG_Y,
            emitter_position: Vec3::new(0.0, 0.0, 2.0),
            max_extend: Vec3::splat(0.5),
            min_extend: Vec3::splat(-0.5),
            distributions: DistributionTable {
                randoms: vec![RandomDistribution { min: 2.0, max: 5.0 }],
                curves: Vec::new(),
            },
            modules: ModuleStack::new(
                vec![
                    SpawnModule::Sphere(SpawnVelSphere {
                        strength: ValueFloat::distributed(3.0, DistRef::random(0)),
                    }),
                    SpawnModule::Rotation(SpawnRotation::default()),
                ],
                vec![UpdateModule::Collision(ParticleCollision {
                    bounce: Bounce {
                        restitution: 1.0,
                        randomize_normal: 0.1,
                    },
                    collision_plane1: CollisionPlane::new(Vec3::Z, Vec3::new(0.0, 0.0, -2.0)),
                    collision_radius: CollisionRadius::custom(0.05),
                    ..Default::default()
                })],
            ),
        }
    }
}

impl EmitterConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded emitter config from {} ({} spawn / {} update modules)",
            path.display(),
            config.modules.spawn.len(),
            config.modules.update.len()
        );
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the kernels cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_time > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_time must be positive, got {}",
                self.tick_time
            )));
        }
        if !(self.lifetime > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "lifetime must be positive, got {}",
                self.lifetime
            )));
        }

        for module in &self.modules.update {
            let UpdateModule::Collision(collision) = module;
            let mut planes = vec![collision.collision_plane1];
            if collision.use_two_plane {
                planes.push(collision.collision_plane2);
            }
            if planes.iter().any(|plane| is_near_zero(plane.normal)) {
                return Err(ConfigError::Invalid(format!(
                    "{} has a zero-length plane normal",
                    module.name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EmitterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EmitterConfig::from_json_str(r#"{ "seed": 7, "ticks": 10 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.ticks, 10);
        assert_eq!(config.particle_count, 256);
        assert_eq!(config.modules.spawn.len(), 2);
    }

    #[test]
    fn test_round_trip() {
        let config = EmitterConfig::default();
        let json = config.to_json_string().unwrap();
        let back = EmitterConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_modules_from_json() {
        let json = r#"{
            "modules": {
                "spawn": [
                    { "kind": "Cone", "strength": { "value": 2.0 }, "direction": [0.0, 0.0, 1.0], "angle": 20.0 }
                ],
                "update": [
                    {
                        "kind": "Collision",
                        "bounce": { "restitution": 0.5, "randomize_normal": 0.0 },
                        "collision_plane1": { "normal": [0.0, 0.0, 1.0], "position": [0.0, 0.0, 0.0] },
                        "collision_radius": { "type": "Custom", "method": "Bounds", "radius": 0.1, "radius_scale": 1.0 }
                    }
                ]
            }
        }"#;
        let config = EmitterConfig::from_json_str(json).unwrap();
        assert!(matches!(config.modules.spawn[0], SpawnModule::Cone(_)));
        let UpdateModule::Collision(collision) = &config.modules.update[0];
        assert_eq!(collision.bounce.restitution, 0.5);
        assert!(!collision.use_two_plane);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EmitterConfig::from_json_str(r#"{ "tick_time": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EmitterConfig::from_json_str(r#"{ "seed": "abc" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let mut config = EmitterConfig::default();
        let UpdateModule::Collision(c) = &mut config.modules.update[0];
        c.collision_plane1.normal = Vec3::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = EmitterConfig::load("/nonexistent/emitter.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
