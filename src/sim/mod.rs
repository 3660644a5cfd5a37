//! Particle simulation
//!
//! Kernels are deterministic given the random stream:
//! - Seeded RNG only
//! - Spawn kernels write velocity/rotation, update kernels run before integration
//! - Distribution references are resolved before any kernel runs

pub mod collision;
pub mod distribution;
pub mod emitter;
pub mod info;
pub mod module;
pub mod particle;
pub mod spawn;

pub use collision::{
    Bounce, CollisionPlane, CollisionRadius, ParticleCollision, RadiusCalculationMethod,
    RadiusCalculationType,
};
pub use distribution::{
    DistRef, DistributionTable, ValueFloat, ValueVec3, calc_distribution_tick_value,
    update_distribution_ptr,
};
pub use emitter::{Emitter, ParticleStats, RunSummary, TickReport};
pub use info::{BaseInfo, RandomStream, SpawnInfo, UpdateInfo};
pub use module::{ModuleStack, SpawnModule, UpdateModule};
pub use particle::Particle;
