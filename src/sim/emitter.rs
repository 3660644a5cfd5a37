//! Headless emitter driver
//!
//! Owns the particles, the clock and the random stream, and feeds the module
//! stack a fresh context every fixed step. Per-particle bookkeeping that the
//! kernels never touch lives in a `ParticleDataPool`.

use bytemuck::{Pod, Zeroable};
use glam::{Affine3A, Vec3};

use super::info::{BaseInfo, RandomStream, SpawnInfo, UpdateInfo};
use super::module::ModuleStack;
use super::particle::Particle;
use crate::config::EmitterConfig;
use crate::pool::ParticleDataPool;

/// Side record kept per live particle
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleStats {
    /// Emitter time at spawn
    pub spawn_time: f32,
    /// Emitter time of the most recent contact
    pub last_hit_time: f32,
    pub bounces: u32,
    /// Monotonic spawn counter
    pub serial: u32,
}

#[derive(Debug, Clone)]
struct LiveParticle {
    particle: Particle,
    stats: u32,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub collisions: u32,
    pub expired: u32,
}

/// Totals after `Emitter::run`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u32,
    pub spawned: u32,
    pub collisions: u64,
    pub expired: u32,
    pub alive: u32,
    /// Lowest world-space z reached by a live particle
    pub min_world_z: f32,
}

/// One emitter and its live particles
pub struct Emitter {
    config: EmitterConfig,
    random: RandomStream,
    modules: ModuleStack,
    emitter_trans: Affine3A,
    particles: Vec<LiveParticle>,
    pool: ParticleDataPool,
    time: f32,
    spawned: u32,
}

impl Emitter {
    pub fn new(config: EmitterConfig) -> Self {
        let mut modules = config.modules.clone();
        modules.rebind(&config.distributions);
        Self {
            random: RandomStream::new(config.seed),
            emitter_trans: Affine3A::from_translation(config.emitter_position),
            modules,
            particles: Vec::new(),
            pool: ParticleDataPool::new(),
            time: 0.0,
            spawned: 0,
            config,
        }
    }

    /// Current emitter time (seconds)
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Length of one emitter loop (seconds)
    pub fn duration(&self) -> f32 {
        self.config.ticks as f32 * self.config.tick_time
    }

    pub fn alive(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().map(|live| &live.particle)
    }

    /// Side record of the `i`-th live particle
    pub fn stats(&self, i: usize) -> Option<&ParticleStats> {
        let live = self.particles.get(i)?;
        self.pool.data_t::<ParticleStats>(live.stats)
    }

    pub fn pool(&self) -> &ParticleDataPool {
        &self.pool
    }

    /// Re-resolve distribution references, e.g. after editing the table
    pub fn reload_distributions(&mut self) {
        self.modules.rebind(&self.config.distributions);
    }

    /// Create `count` particles at the emitter origin
    pub fn spawn(&mut self, count: u32) {
        let duration = self.duration();
        let info = SpawnInfo {
            base: BaseInfo {
                current_time: self.time,
                duration,
                random: &self.random,
            },
            front: self.config.front,
            local_space: self.config.local_space,
            emitter_trans: self.emitter_trans,
        };

        self.particles.reserve(count as usize);
        for _ in 0..count {
            let mut particle = Particle {
                lifetime: self.config.lifetime,
                spawn_trans: self.emitter_trans,
                ..Default::default()
            };
            self.modules.spawn(&info, &mut particle);

            let stats = self.pool.alloc_t(&ParticleStats {
                spawn_time: self.time,
                serial: self.spawned,
                ..Default::default()
            });
            self.spawned += 1;
            self.particles.push(LiveParticle { particle, stats });
        }
        log::debug!("Spawned {count} particles at t={:.3}", self.time);
    }

    /// Advance every live particle by `dt`, then drop the expired ones
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        let info = UpdateInfo {
            base: BaseInfo {
                current_time: self.time,
                duration: self.duration(),
                random: &self.random,
            },
            front: self.config.front,
            local_space: self.config.local_space,
            emitter_trans: self.emitter_trans,
            tick_time: dt,
            max_extend: self.config.max_extend,
            min_extend: self.config.min_extend,
        };

        for live in &mut self.particles {
            self.modules.update(&info, &mut live.particle);
            if live.particle.is_collided {
                report.collisions += 1;
                if let Some(stats) = self.pool.data_t_mut::<ParticleStats>(live.stats) {
                    stats.bounces += 1;
                    stats.last_hit_time =
                        self.time + dt - live.particle.collision_time_before_tick;
                }
            }
            live.particle.integrate(dt);
        }

        let pool = &mut self.pool;
        self.particles.retain(|live| {
            if live.particle.is_dead() {
                pool.free_t::<ParticleStats>(live.stats);
                report.expired += 1;
                false
            } else {
                true
            }
        });

        self.time += dt;
        report
    }

    /// Spawn the configured burst and run the configured number of ticks
    pub fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary {
            min_world_z: f32::INFINITY,
            ..Default::default()
        };

        self.spawn(self.config.particle_count);
        summary.spawned = self.config.particle_count;

        for _ in 0..self.config.ticks {
            let report = self.tick(self.config.tick_time);
            summary.ticks += 1;
            summary.collisions += u64::from(report.collisions);
            summary.expired += report.expired;

            for particle in self.particles() {
                let z = particle
                    .world_position(self.config.local_space, &self.emitter_trans)
                    .z;
                summary.min_world_z = summary.min_world_z.min(z);
            }
        }

        summary.alive = self.particles.len() as u32;
        if summary.min_world_z == f32::INFINITY {
            summary.min_world_z = self.emitter_trans.translation.z;
        }
        log::info!(
            "Ran {} ticks: {} spawned, {} alive, {} expired, {} collisions",
            summary.ticks,
            summary.spawned,
            summary.alive,
            summary.expired,
            summary.collisions
        );
        summary
    }

    /// World-space positions of every live particle
    pub fn world_positions(&self) -> Vec<Vec3> {
        self.particles()
            .map(|p| p.world_position(self.config.local_space, &self.emitter_trans))
            .collect()
    }
}
