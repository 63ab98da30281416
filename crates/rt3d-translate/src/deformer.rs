//! Deformed copies of a mesh.

use nalgebra::Vector3;
use rt3d_model::{Mesh, ResultField, ResultLocation};
use tracing::{debug, warn};

use crate::error::{Result, TranslateError};

pub struct MeshDeformer;

impl MeshDeformer {
    /// Independent copy of `mesh` with `factor * displacement` added to
    /// every node in the displacement support. Other nodes, and nodes whose
    /// displacement is not finite, keep their coordinates.
    pub fn deform(mesh: &Mesh, displacement: &ResultField, factor: f64) -> Result<Mesh> {
        if displacement.location() != ResultLocation::Nodal {
            return Err(TranslateError::UnsupportedLocation(displacement.location()));
        }
        if displacement.components() != 3 {
            return Err(TranslateError::ComponentMismatch {
                field: displacement.name().to_string(),
                expected: 3,
                found: displacement.components(),
            });
        }

        let mut deformed = mesh.clone();
        if factor == 0.0 {
            return Ok(deformed);
        }

        let mut moved = 0;
        let mut unknown = 0;
        for (id, values) in displacement.iter() {
            let Some(position) = mesh.node_position(id) else {
                unknown += 1;
                continue;
            };
            let delta = Vector3::new(values[0], values[1], values[2]);
            if !delta.iter().all(|v| v.is_finite()) {
                continue;
            }
            deformed.translate_node(position, &(delta * factor));
            moved += 1;
        }

        if unknown > 0 {
            warn!(
                "{}: {} displaced nodes are not in the mesh and were skipped",
                displacement.name(),
                unknown
            );
        }
        debug!("deformed {} of {} nodes by factor {}", moved, mesh.node_count(), factor);
        Ok(deformed)
    }

    /// Unscaled copy, used when the request does not deform the geometry
    pub fn undeformed(mesh: &Mesh) -> Mesh {
        mesh.clone()
    }
}
