//! Result archive access.
//!
//! A [`ResultRepository`] owns the undeformed mesh and the raw result
//! quantities of every result set. The translation pipeline only talks to
//! archives through this trait.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::field::ResultField;
use crate::mesh::Mesh;

/// Physics category of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Physics {
    Structural,
    Thermal,
}

impl Physics {
    pub fn name(self) -> &'static str {
        match self {
            Physics::Structural => "structural",
            Physics::Thermal => "thermal",
        }
    }
}

/// Raw quantities an archive can provide for a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    /// Displacement vector (ux, uy, uz)
    Displacement,
    /// Stress tensor in Voigt order (xx, yy, zz, xy, yz, xz)
    Stress,
    /// Temperature scalar
    Temperature,
}

impl Quantity {
    pub fn components(self) -> usize {
        match self {
            Quantity::Displacement => 3,
            Quantity::Stress => 6,
            Quantity::Temperature => 1,
        }
    }

    pub fn physics(self) -> Physics {
        match self {
            Quantity::Displacement | Quantity::Stress => Physics::Structural,
            Quantity::Temperature => Physics::Thermal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quantity::Displacement => "displacement",
            Quantity::Stress => "stress",
            Quantity::Temperature => "temperature",
        }
    }
}

/// Read-only access to an analysis result archive
pub trait ResultRepository {
    /// Fresh copy of the undeformed mesh
    fn mesh(&self) -> Mesh;

    /// Whether the archive carries results of the given physics category
    fn has_physics(&self, physics: Physics) -> bool;

    /// Available result-set indices, ascending
    fn result_sets(&self) -> Vec<u32>;

    /// Raw quantity of a result set, `None` if the set or quantity is absent
    fn quantity(&self, set: u32, quantity: Quantity) -> Option<ResultField>;

    /// File backing the archive, if any
    fn source_path(&self) -> Option<&Path> {
        None
    }
}

/// In-memory archive, useful for programmatic pipelines and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    mesh: Mesh,
    sets: BTreeMap<u32, BTreeMap<Quantity, ResultField>>,
}

impl MemoryRepository {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            sets: BTreeMap::new(),
        }
    }

    /// Store `field` as `quantity` of result set `set`
    pub fn insert(&mut self, set: u32, quantity: Quantity, field: ResultField) -> &mut Self {
        self.sets.entry(set).or_default().insert(quantity, field);
        self
    }

    pub fn with_quantity(mut self, set: u32, quantity: Quantity, field: ResultField) -> Self {
        self.insert(set, quantity, field);
        self
    }
}

impl ResultRepository for MemoryRepository {
    fn mesh(&self) -> Mesh {
        self.mesh.clone()
    }

    fn has_physics(&self, physics: Physics) -> bool {
        self.sets
            .values()
            .flat_map(|quantities| quantities.keys())
            .any(|q| q.physics() == physics)
    }

    fn result_sets(&self) -> Vec<u32> {
        self.sets.keys().copied().collect()
    }

    fn quantity(&self, set: u32, quantity: Quantity) -> Option<ResultField> {
        self.sets.get(&set)?.get(&quantity).cloned()
    }
}
