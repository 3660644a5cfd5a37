//! Particle simulation core
//!
//! Core modules:
//! - `pool`: 16-byte aligned, fixed-stride attribute storage with free-list reuse
//! - `math`: Look-at bases, cone sampling, reflection and simplex noise
//! - `sim`: Particle record, per-tick context, distributions, the spawn/update kernels
//!   and a headless emitter driver
//! - `config`: Data-driven emitter setup (JSON)
//!
//! Kernels own no particles and no clock. A driver (`sim::emitter` or your
//! own) hands them a borrowed context and a `&mut Particle`, and the kernels
//! mutate it in place.

pub mod config;
pub mod math;
pub mod pool;
pub mod sim;

pub use config::{ConfigError, EmitterConfig};
pub use pool::{ParticleDataPool, ParticleDataSet};

/// Simulation constants
pub mod consts {
    /// Byte granularity of every pooled record
    pub const POOL_ALIGNMENT: u32 = 16;
    /// Largest record a pool set accepts
    pub const MAX_RECORD_SIZE: u32 = 64 * 1024;

    /// Float comparison epsilon (matches single precision machine epsilon)
    pub const FLOAT_EPSILON: f32 = f32::EPSILON;
    /// Vectors shorter than this are treated as zero
    pub const VECTOR_EPSILON: f32 = 1.0e-6;
    /// |cos| above this counts as parallel
    pub const ALMOST_ONE: f32 = 0.999;

    /// Default simulation step for the demo driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
}

/// True when `v` is within `VECTOR_EPSILON` of the zero vector on every axis
#[inline]
pub fn is_near_zero(v: glam::Vec3) -> bool {
    v.abs().max_element() <= consts::VECTOR_EPSILON
}

/// Component-wise closeness used for axis comparisons
#[inline]
pub fn is_close(a: glam::Vec3, b: glam::Vec3) -> bool {
    a.abs_diff_eq(b, 0.001)
}
