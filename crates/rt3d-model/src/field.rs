//! Result fields and dense per-entity attributes.

use serde::{Deserialize, Serialize};

/// Location of result data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultLocation {
    /// One value per node
    Nodal,
    /// One value per element
    Elemental,
    /// Per-element values stored at the element's nodes
    ElementNodal,
}

impl std::fmt::Display for ResultLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ResultLocation::Nodal => "nodal",
            ResultLocation::Elemental => "elemental",
            ResultLocation::ElementNodal => "element-nodal",
        };
        f.write_str(label)
    }
}

/// A named quantity over a support set of node or element ids.
///
/// Values are stored flat, `components` values per supported entity, in the
/// order the entities were pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultField {
    name: String,
    location: ResultLocation,
    components: usize,
    ids: Vec<i32>,
    values: Vec<f64>,
}

impl ResultField {
    pub fn new(name: impl Into<String>, location: ResultLocation, components: usize) -> Self {
        Self {
            name: name.into(),
            location,
            components,
            ids: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a single-component field
    pub fn scalar(
        name: impl Into<String>,
        location: ResultLocation,
        entries: impl IntoIterator<Item = (i32, f64)>,
    ) -> Self {
        let mut field = Self::new(name, location, 1);
        for (id, value) in entries {
            field.ids.push(id);
            field.values.push(value);
        }
        field
    }

    /// Build a three-component field
    pub fn vector(
        name: impl Into<String>,
        location: ResultLocation,
        entries: impl IntoIterator<Item = (i32, [f64; 3])>,
    ) -> Self {
        let mut field = Self::new(name, location, 3);
        for (id, value) in entries {
            field.ids.push(id);
            field.values.extend_from_slice(&value);
        }
        field
    }

    /// Append the values of one entity
    pub fn push(&mut self, id: i32, values: &[f64]) -> Result<(), String> {
        if values.len() != self.components {
            return Err(format!(
                "field {} expects {} components per entity, got {} for id {}",
                self.name,
                self.components,
                values.len(),
                id
            ));
        }
        self.ids.push(id);
        self.values.extend_from_slice(values);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with its trailing `_`-separated qualifier removed, e.g.
    /// `von_mises_stress_set2` becomes `von_mises_stress`.
    pub fn base_name(&self) -> &str {
        match self.name.rsplit_once('_') {
            Some((base, _)) if !base.is_empty() => base,
            _ => &self.name,
        }
    }

    pub fn location(&self) -> ResultLocation {
        self.location
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of supported entities
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Supported entity ids
    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    /// Iterate `(id, values)` pairs in support order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[f64])> + '_ {
        self.ids
            .iter()
            .copied()
            .zip(self.values.chunks_exact(self.components.max(1)))
    }

    /// Maximum of one component over the support, ignoring NaN
    pub fn component_max(&self, component: usize) -> Option<f64> {
        if component >= self.components {
            return None;
        }
        self.iter()
            .map(|(_, v)| v[component])
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }

    /// Derive a new field with the same support by applying `f` to every
    /// entity's values. `f` must return exactly `components` values.
    pub fn derive(
        &self,
        name: impl Into<String>,
        components: usize,
        f: impl Fn(&[f64]) -> Vec<f64>,
    ) -> Result<ResultField, String> {
        let mut out = ResultField::new(name, self.location, components);
        for (id, values) in self.iter() {
            out.push(id, &f(values))?;
        }
        Ok(out)
    }

    /// Same data under a different location tag
    pub fn with_location(mut self, location: ResultLocation) -> Self {
        self.location = location;
        self
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Full-coverage per-entity array produced by mapping a [`ResultField`]
/// onto a mesh. Entities without a result hold NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseAttribute {
    pub name: String,
    pub location: ResultLocation,
    pub components: usize,
    pub values: Vec<f64>,
}

impl DenseAttribute {
    /// Attribute of `len` entities, every value undefined
    pub fn undefined(
        name: impl Into<String>,
        location: ResultLocation,
        components: usize,
        len: usize,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            components,
            values: vec![f64::NAN; len * components],
        }
    }

    /// Number of entities covered
    pub fn len(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&[f64]> {
        let start = index * self.components;
        self.values.get(start..start + self.components)
    }

    pub fn set(&mut self, index: usize, values: &[f64]) {
        let start = index * self.components;
        if let Some(slot) = self.values.get_mut(start..start + self.components) {
            slot.copy_from_slice(values);
        }
    }

    /// An entity is defined when none of its components is NaN
    pub fn is_defined(&self, index: usize) -> bool {
        self.get(index)
            .is_some_and(|v| v.iter().all(|x| !x.is_nan()))
    }

    pub fn defined_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_defined(i)).count()
    }

    /// Scalar used for coloring: the value itself, or the Euclidean norm of
    /// multi-component entries. NaN for undefined entities.
    pub fn magnitude(&self, index: usize) -> f64 {
        match self.get(index) {
            Some([v]) => *v,
            Some(v) => v.iter().map(|x| x * x).sum::<f64>().sqrt(),
            None => f64::NAN,
        }
    }

    /// Range of [`magnitude`](Self::magnitude) over defined entities
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        (0..self.len())
            .map(|i| self.magnitude(i))
            .filter(|m| m.is_finite())
            .fold(None, |acc, m| match acc {
                None => Some((m, m)),
                Some((lo, hi)) => Some((lo.min(m), hi.max(m))),
            })
    }
}
