//! Closed module sets and their two-phase protocol
//!
//! Phase 1, `rebind`: resolve every distribution reference against the
//! emitter's table. Runs on one thread after each table (re)load.
//!
//! Phase 2, `spawn`/`update`: run the kernels. Any number of particles may be
//! processed once phase 1 has finished; the stack itself is only read.

use serde::{Deserialize, Serialize};

use super::collision::ParticleCollision;
use super::distribution::DistributionTable;
use super::info::{SpawnInfo, UpdateInfo};
use super::particle::Particle;
use super::spawn::{
    SpawnRotation, SpawnVelCone, SpawnVelConcentrate, SpawnVelDirection, SpawnVelSector,
    SpawnVelSphere,
};

/// Kernels that run once per new particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SpawnModule {
    Direction(SpawnVelDirection),
    Sector(SpawnVelSector),
    Cone(SpawnVelCone),
    Sphere(SpawnVelSphere),
    Concentrate(SpawnVelConcentrate),
    Rotation(SpawnRotation),
}

impl SpawnModule {
    pub fn execute(&self, info: &SpawnInfo<'_>, particle: &mut Particle) {
        match self {
            SpawnModule::Direction(m) => m.execute(info, particle),
            SpawnModule::Sector(m) => m.execute(info, particle),
            SpawnModule::Cone(m) => m.execute(info, particle),
            SpawnModule::Sphere(m) => m.execute(info, particle),
            SpawnModule::Concentrate(m) => m.execute(info, particle),
            SpawnModule::Rotation(m) => m.execute(info, particle),
        }
    }

    pub fn update_dist_ptr(&mut self, table: &DistributionTable) {
        match self {
            SpawnModule::Direction(m) => m.update_dist_ptr(table),
            SpawnModule::Sector(m) => m.update_dist_ptr(table),
            SpawnModule::Cone(m) => m.update_dist_ptr(table),
            SpawnModule::Sphere(m) => m.update_dist_ptr(table),
            SpawnModule::Concentrate(m) => m.update_dist_ptr(table),
            SpawnModule::Rotation(m) => m.update_dist_ptr(table),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpawnModule::Direction(_) => "SpawnVelDirection",
            SpawnModule::Sector(_) => "SpawnVelSector",
            SpawnModule::Cone(_) => "SpawnVelCone",
            SpawnModule::Sphere(_) => "SpawnVelSphere",
            SpawnModule::Concentrate(_) => "SpawnVelConcentrate",
            SpawnModule::Rotation(_) => "SpawnRotation",
        }
    }
}

/// Kernels that run every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum UpdateModule {
    Collision(ParticleCollision),
}

impl UpdateModule {
    pub fn execute(&self, info: &UpdateInfo<'_>, particle: &mut Particle) {
        match self {
            UpdateModule::Collision(m) => m.execute(info, particle),
        }
    }

    /// Collision samples no distributions; kept so every module rebinds alike
    pub fn update_dist_ptr(&mut self, _table: &DistributionTable) {
        match self {
            UpdateModule::Collision(_) => {}
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpdateModule::Collision(_) => "ParticleCollision",
        }
    }
}

/// Ordered spawn and update modules of one emitter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleStack {
    #[serde(default)]
    pub spawn: Vec<SpawnModule>,
    #[serde(default)]
    pub update: Vec<UpdateModule>,
    #[serde(skip)]
    bound: bool,
}

impl ModuleStack {
    pub fn new(spawn: Vec<SpawnModule>, update: Vec<UpdateModule>) -> Self {
        Self {
            spawn,
            update,
            bound: false,
        }
    }

    /// Phase 1: resolve distribution references in every module
    pub fn rebind(&mut self, table: &DistributionTable) {
        for module in &mut self.spawn {
            module.update_dist_ptr(table);
        }
        for module in &mut self.update {
            module.update_dist_ptr(table);
        }
        self.bound = true;
        log::debug!(
            "Rebound {} spawn / {} update modules",
            self.spawn.len(),
            self.update.len()
        );
    }

    /// Whether `rebind` has run since the stack was built or loaded
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Phase 2: initialise a new particle
    pub fn spawn(&self, info: &SpawnInfo<'_>, particle: &mut Particle) {
        debug_assert!(self.bound, "ModuleStack::spawn before rebind");
        for module in &self.spawn {
            module.execute(info, particle);
        }
    }

    /// Phase 2: advance a live particle by one tick (before integration)
    pub fn update(&self, info: &UpdateInfo<'_>, particle: &mut Particle) {
        debug_assert!(self.bound, "ModuleStack::update before rebind");
        particle.is_collided = false;
        for module in &self.update {
            module.execute(info, particle);
        }
    }
}
