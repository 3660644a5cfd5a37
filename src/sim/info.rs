//! Per-tick context handed to the kernels by the driver

use std::cell::RefCell;

use glam::{Affine3A, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Seeded uniform random source shared by every kernel call in a tick.
///
/// Interior mutability lets the read-only info structs draw numbers. Not
/// `Sync`: one stream per simulation thread.
#[derive(Debug)]
pub struct RandomStream {
    rng: RefCell<Pcg32>,
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RefCell::new(Pcg32::seed_from_u64(seed)),
        }
    }

    /// Uniform sample in [0, 1)
    pub fn rand(&self) -> f32 {
        self.rng.borrow_mut().random::<f32>()
    }
}

/// Timing and randomness common to spawn and update calls
#[derive(Debug, Clone, Copy)]
pub struct BaseInfo<'a> {
    /// Emitter time (seconds)
    pub current_time: f32,
    /// Emitter loop duration (seconds)
    pub duration: f32,
    pub random: &'a RandomStream,
}

impl<'a> BaseInfo<'a> {
    pub fn new(random: &'a RandomStream) -> Self {
        Self {
            current_time: 0.0,
            duration: 1.0,
            random,
        }
    }

    /// Emitter time normalized by duration, in [0, 1]
    pub fn emitter_percent(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.current_time / self.duration).clamp(0.0, 1.0)
    }
}

/// Context for spawn kernels
#[derive(Debug, Clone, Copy)]
pub struct SpawnInfo<'a> {
    pub base: BaseInfo<'a>,
    /// Facing axis of the emitter's sprites
    pub front: Vec3,
    /// Whether particles simulate in emitter space
    pub local_space: bool,
    pub emitter_trans: Affine3A,
}

impl<'a> SpawnInfo<'a> {
    pub fn new(random: &'a RandomStream) -> Self {
        Self {
            base: BaseInfo::new(random),
            front: Vec3::NEG_Y,
            local_space: true,
            emitter_trans: Affine3A::IDENTITY,
        }
    }

    #[inline]
    pub fn rand(&self) -> f32 {
        self.base.random.rand()
    }
}

/// Context for update kernels
#[derive(Debug, Clone, Copy)]
pub struct UpdateInfo<'a> {
    pub base: BaseInfo<'a>,
    pub front: Vec3,
    pub local_space: bool,
    pub emitter_trans: Affine3A,
    /// Length of this tick (seconds)
    pub tick_time: f32,
    /// Mesh AABB max corner at unit scale
    pub max_extend: Vec3,
    /// Mesh AABB min corner at unit scale
    pub min_extend: Vec3,
}

impl<'a> UpdateInfo<'a> {
    pub fn new(random: &'a RandomStream, tick_time: f32) -> Self {
        Self {
            base: BaseInfo::new(random),
            front: Vec3::NEG_Y,
            local_space: true,
            emitter_trans: Affine3A::IDENTITY,
            tick_time,
            max_extend: Vec3::splat(0.5),
            min_extend: Vec3::splat(-0.5),
        }
    }

    #[inline]
    pub fn rand(&self) -> f32 {
        self.base.random.rand()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_stream_seeded() {
        let a = RandomStream::new(42);
        let b = RandomStream::new(42);
        let xs: Vec<f32> = (0..16).map(|_| a.rand()).collect();
        let ys: Vec<f32> = (0..16).map(|_| b.rand()).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_emitter_percent() {
        let random = RandomStream::new(1);
        let mut base = BaseInfo::new(&random);
        base.duration = 4.0;
        base.current_time = 1.0;
        assert!((base.emitter_percent() - 0.25).abs() < 1e-6);
        base.duration = 0.0;
        assert_eq!(base.emitter_percent(), 0.0);
    }
}
