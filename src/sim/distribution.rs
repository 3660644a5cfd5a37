//! Distribution evaluator
//!
//! Kernel parameters that vary per particle are `ValueFloat`/`ValueVec3`: a
//! base value plus an optional reference into the emitter's
//! `DistributionTable`. Binding is two-phase:
//!
//! 1. `update_distribution_ptr` copies the referenced entry into the value
//!    (single-threaded, after every table load or relocation).
//! 2. `calc_distribution_tick_value` samples the bound entry during a tick.
//!
//! A value whose reference is unset or dangling evaluates to its base value.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::info::BaseInfo;
use super::particle::Particle;

/// Which table a `DistRef` indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistKind {
    Random,
    Curve,
}

/// Reference to a table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistRef {
    pub kind: DistKind,
    pub index: u32,
}

impl DistRef {
    pub fn random(index: u32) -> Self {
        Self {
            kind: DistKind::Random,
            index,
        }
    }

    pub fn curve(index: u32) -> Self {
        Self {
            kind: DistKind::Curve,
            index,
        }
    }
}

/// Uniform value in [min, max)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomDistribution {
    pub min: f32,
    pub max: f32,
}

/// What drives the x axis of a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TickMode {
    /// Particle age / lifetime
    #[default]
    Particle,
    /// Emitter time / duration
    Emitter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Piecewise-linear curve over [0, 1], clamped at the end keys
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveDistribution {
    /// Sorted by `time`
    pub keys: Vec<CurveKey>,
    #[serde(default)]
    pub tick_mode: TickMode,
}

impl CurveDistribution {
    pub fn sample(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if x <= first.time {
            return first.value;
        }
        if x >= last.time {
            return last.value;
        }

        let upper = self.keys.partition_point(|k| k.time <= x);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        a.value + (b.value - a.value) * (x - a.time) / span
    }
}

/// A resolved table entry
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    Random(RandomDistribution),
    Curve(CurveDistribution),
}

impl Distribution {
    pub fn tick_value(&self, base: &BaseInfo<'_>, particle: &Particle) -> f32 {
        match self {
            Distribution::Random(r) => r.min + (r.max - r.min) * base.random.rand(),
            Distribution::Curve(c) => {
                let x = match c.tick_mode {
                    TickMode::Particle => particle.life_percent(),
                    TickMode::Emitter => base.emitter_percent(),
                };
                c.sample(x)
            }
        }
    }
}

/// All distributions of one emitter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DistributionTable {
    #[serde(default)]
    pub randoms: Vec<RandomDistribution>,
    #[serde(default)]
    pub curves: Vec<CurveDistribution>,
}

impl DistributionTable {
    /// Copy of the entry `dist` points at, if it exists
    pub fn resolve(&self, dist: DistRef) -> Option<Distribution> {
        let index = dist.index as usize;
        match dist.kind {
            DistKind::Random => self.randoms.get(index).copied().map(Distribution::Random),
            DistKind::Curve => self.curves.get(index).cloned().map(Distribution::Curve),
        }
    }
}

/// A parameter that can be sampled from a distribution each tick
pub trait DistributedValue {
    type Output;

    /// Re-resolve table references (rebind phase)
    fn update_distribution_ptr(&mut self, table: &DistributionTable);

    /// Value for this tick (execute phase)
    fn tick_value(&self, base: &BaseInfo<'_>, particle: &Particle) -> Self::Output;
}

/// Rebind `value` against `table`
pub fn update_distribution_ptr<V: DistributedValue>(value: &mut V, table: &DistributionTable) {
    value.update_distribution_ptr(table);
}

/// Sample `value` for `particle` at this tick
pub fn calc_distribution_tick_value<V: DistributedValue>(
    value: &V,
    base: &BaseInfo<'_>,
    particle: &Particle,
) -> V::Output {
    value.tick_value(base, particle)
}

fn bind(dist: Option<DistRef>, table: &DistributionTable) -> Option<Distribution> {
    let dist = dist?;
    let resolved = table.resolve(dist);
    if resolved.is_none() {
        log::warn!(
            "Distribution {:?}[{}] not in table, falling back to base value",
            dist.kind,
            dist.index
        );
    }
    resolved
}

/// Scalar parameter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueFloat {
    pub value: f32,
    #[serde(default)]
    pub dist: Option<DistRef>,
    #[serde(skip)]
    bound: Option<Distribution>,
}

impl ValueFloat {
    pub fn constant(value: f32) -> Self {
        Self {
            value,
            dist: None,
            bound: None,
        }
    }

    pub fn distributed(value: f32, dist: DistRef) -> Self {
        Self {
            value,
            dist: Some(dist),
            bound: None,
        }
    }

    /// Whether a table entry is currently bound
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }
}

impl DistributedValue for ValueFloat {
    type Output = f32;

    fn update_distribution_ptr(&mut self, table: &DistributionTable) {
        self.bound = bind(self.dist, table);
    }

    fn tick_value(&self, base: &BaseInfo<'_>, particle: &Particle) -> f32 {
        match &self.bound {
            Some(dist) => dist.tick_value(base, particle),
            None => self.value,
        }
    }
}

/// Vector parameter; each component may reference its own distribution
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueVec3 {
    pub value: Vec3,
    #[serde(default)]
    pub dist: [Option<DistRef>; 3],
    #[serde(skip)]
    bound: [Option<Distribution>; 3],
}

impl ValueVec3 {
    pub fn constant(value: Vec3) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    pub fn distributed(value: Vec3, dist: [Option<DistRef>; 3]) -> Self {
        Self {
            value,
            dist,
            ..Default::default()
        }
    }
}

impl DistributedValue for ValueVec3 {
    type Output = Vec3;

    fn update_distribution_ptr(&mut self, table: &DistributionTable) {
        for (bound, dist) in self.bound.iter_mut().zip(self.dist) {
            *bound = bind(dist, table);
        }
    }

    fn tick_value(&self, base: &BaseInfo<'_>, particle: &Particle) -> Vec3 {
        let mut out = self.value;
        for (axis, bound) in self.bound.iter().enumerate() {
            if let Some(dist) = bound {
                out[axis] = dist.tick_value(base, particle);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::info::RandomStream;

    fn table() -> DistributionTable {
        DistributionTable {
            randoms: vec![RandomDistribution { min: 2.0, max: 4.0 }],
            curves: vec![CurveDistribution {
                keys: vec![
                    CurveKey { time: 0.0, value: 0.0 },
                    CurveKey { time: 0.5, value: 10.0 },
                    CurveKey { time: 1.0, value: 0.0 },
                ],
                tick_mode: TickMode::Particle,
            }],
        }
    }

    #[test]
    fn test_unbound_uses_base_value() {
        let random = RandomStream::new(7);
        let base = BaseInfo::new(&random);
        let v = ValueFloat::distributed(3.0, DistRef::random(0));
        // Not rebound yet
        assert_eq!(calc_distribution_tick_value(&v, &base, &Particle::default()), 3.0);
    }

    #[test]
    fn test_random_binding() {
        let random = RandomStream::new(7);
        let base = BaseInfo::new(&random);
        let mut v = ValueFloat::distributed(0.0, DistRef::random(0));
        update_distribution_ptr(&mut v, &table());
        assert!(v.is_bound());
        for _ in 0..100 {
            let x = calc_distribution_tick_value(&v, &base, &Particle::default());
            assert!((2.0..4.0).contains(&x));
        }
    }

    #[test]
    fn test_dangling_reference_falls_back() {
        let mut v = ValueFloat::distributed(5.0, DistRef::curve(9));
        update_distribution_ptr(&mut v, &table());
        assert!(!v.is_bound());
    }

    #[test]
    fn test_curve_by_particle_age() {
        let random = RandomStream::new(7);
        let base = BaseInfo::new(&random);
        let mut v = ValueFloat::distributed(0.0, DistRef::curve(0));
        update_distribution_ptr(&mut v, &table());

        let mut p = Particle::default();
        p.lifetime = 2.0;
        p.current_life = 0.5; // 25%
        assert!((calc_distribution_tick_value(&v, &base, &p) - 5.0).abs() < 1e-5);
        p.current_life = 1.0; // 50%
        assert!((calc_distribution_tick_value(&v, &base, &p) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_curve_clamps_and_empty() {
        let c = &table().curves[0];
        assert_eq!(c.sample(-1.0), 0.0);
        assert_eq!(c.sample(2.0), 0.0);
        assert_eq!(CurveDistribution::default().sample(0.3), 0.0);
    }

    #[test]
    fn test_vec3_per_component() {
        let random = RandomStream::new(7);
        let base = BaseInfo::new(&random);
        let mut v = ValueVec3::distributed(
            Vec3::new(1.0, 1.0, 1.0),
            [None, Some(DistRef::random(0)), None],
        );
        update_distribution_ptr(&mut v, &table());
        let out = calc_distribution_tick_value(&v, &base, &Particle::default());
        assert_eq!(out.x, 1.0);
        assert!((2.0..4.0).contains(&out.y));
        assert_eq!(out.z, 1.0);
    }

    #[test]
    fn test_binding_not_serialized() {
        let mut v = ValueFloat::distributed(1.0, DistRef::random(0));
        update_distribution_ptr(&mut v, &table());
        let json = serde_json::to_string(&v).unwrap();
        let back: ValueFloat = serde_json::from_str(&json).unwrap();
        assert!(!back.is_bound());
        assert_eq!(back.dist, Some(DistRef::random(0)));
    }
}
