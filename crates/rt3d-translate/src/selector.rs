//! Selection of one result field from an archive.
//!
//! The selector reads the raw quantity behind a [`ResultKind`] for one
//! result set and reduces it to the requested component or derived measure.

use std::collections::HashMap;

use rt3d_io::postprocess::{TensorComponents, compute_mises_stress, compute_principal_stresses};
use rt3d_model::{Mesh, Quantity, ResultField, ResultLocation, ResultRepository};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TranslateError};
use crate::kind::ResultKind;

/// Where stress-derived fields live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StressLocation {
    /// Values at the nodes, as stored in the archive
    #[default]
    Nodal,
    /// Nodal tensors averaged over each element
    Elemental,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSelector {
    stress_location: StressLocation,
}

impl FieldSelector {
    pub fn new(stress_location: StressLocation) -> Self {
        Self { stress_location }
    }

    /// Extract the field for `kind` from result set `step`.
    ///
    /// The field is named `<label>_set<step>`, e.g. `von_mises_stress_set1`.
    pub fn select(
        &self,
        archive: &dyn ResultRepository,
        step: u32,
        kind: ResultKind,
    ) -> Result<ResultField> {
        let sets = archive.result_sets();
        if !sets.contains(&step) {
            let available = sets
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(TranslateError::not_found(format!(
                "result set {} is not in the archive (available: {})",
                step,
                if available.is_empty() { "none" } else { available.as_str() }
            )));
        }

        let quantity = kind.quantity();
        let physics = quantity.physics();
        if !archive.has_physics(physics) {
            return Err(TranslateError::not_found(format!(
                "the archive holds no {} results, {} is unavailable",
                physics.name(),
                kind
            )));
        }

        let raw = archive.quantity(step, quantity).ok_or_else(|| {
            TranslateError::not_found(format!(
                "result set {} has no {} results",
                step,
                quantity.name()
            ))
        })?;
        if raw.components() != quantity.components() {
            return Err(TranslateError::ComponentMismatch {
                field: raw.name().to_string(),
                expected: quantity.components(),
                found: raw.components(),
            });
        }

        let raw = match (quantity, self.stress_location, raw.location()) {
            (Quantity::Stress, StressLocation::Elemental, ResultLocation::Nodal) => {
                element_average(&raw, &archive.mesh())?
            }
            _ => raw,
        };

        let name = format!("{}_set{}", kind.label(), step);
        let field = match kind {
            ResultKind::U | ResultKind::Tmp => raw.renamed(name),
            ResultKind::Ux | ResultKind::Sx => component(&raw, name, 0)?,
            ResultKind::Uy | ResultKind::Sy => component(&raw, name, 1)?,
            ResultKind::Uz | ResultKind::Sz => component(&raw, name, 2)?,
            ResultKind::Sxy => component(&raw, name, 3)?,
            ResultKind::Syz => component(&raw, name, 4)?,
            ResultKind::Sxz => component(&raw, name, 5)?,
            ResultKind::Usum => derive_scalar(&raw, name, |v| {
                v.iter().map(|x| x * x).sum::<f64>().sqrt()
            })?,
            ResultKind::S1 => derive_scalar(&raw, name, |v| {
                compute_principal_stresses(&TensorComponents::from_voigt(v)).max
            })?,
            ResultKind::S2 => derive_scalar(&raw, name, |v| {
                compute_principal_stresses(&TensorComponents::from_voigt(v)).mid
            })?,
            ResultKind::S3 => derive_scalar(&raw, name, |v| {
                compute_principal_stresses(&TensorComponents::from_voigt(v)).min
            })?,
            ResultKind::Seqv => derive_scalar(&raw, name, |v| {
                compute_mises_stress(&TensorComponents::from_voigt(v))
            })?,
        };

        debug!(
            "selected {} ({}, {} entities)",
            field.name(),
            field.location(),
            field.len()
        );
        Ok(field)
    }
}

fn component(raw: &ResultField, name: String, index: usize) -> Result<ResultField> {
    derive_scalar(raw, name, |v| v[index])
}

fn derive_scalar(
    raw: &ResultField,
    name: String,
    f: impl Fn(&[f64]) -> f64,
) -> Result<ResultField> {
    raw.derive(name, 1, |v| vec![f(v)])
        .map_err(TranslateError::ResultNotFound)
}

/// Average a nodal field over the nodes of each element. Elements with a
/// node outside the support get no value.
fn element_average(field: &ResultField, mesh: &Mesh) -> Result<ResultField> {
    let by_node: HashMap<i32, &[f64]> = field.iter().collect();
    let components = field.components();
    let mut averaged = ResultField::new(field.name(), ResultLocation::Elemental, components);

    for element in mesh.elements() {
        let values: Option<Vec<&[f64]>> = element
            .nodes
            .iter()
            .map(|id| by_node.get(id).copied())
            .collect();
        let Some(values) = values.filter(|v| !v.is_empty()) else {
            continue;
        };

        let mut sum = vec![0.0; components];
        for node_values in &values {
            for (total, value) in sum.iter_mut().zip(node_values.iter()) {
                *total += value;
            }
        }
        let count = values.len() as f64;
        sum.iter_mut().for_each(|total| *total /= count);
        averaged
            .push(element.id, &sum)
            .map_err(TranslateError::ResultNotFound)?;
    }

    debug!(
        "averaged {} over {} of {} elements",
        field.name(),
        averaged.len(),
        mesh.element_count()
    );
    Ok(averaged)
}
