//! Spawn kernels: run once when a particle is created

pub mod rotation;
pub mod velocity;

pub use rotation::SpawnRotation;
pub use velocity::{
    SpawnVelCone, SpawnVelConcentrate, SpawnVelDirection, SpawnVelSector, SpawnVelSphere,
};
