//! Sparse-to-dense mapping of result fields onto mesh entities.

use rt3d_model::{DenseAttribute, Mesh, ResultField, ResultLocation};
use tracing::{debug, warn};

use crate::error::{Result, TranslateError};

pub struct FieldMapper;

impl FieldMapper {
    /// One value tuple per node (nodal fields) or element (elemental
    /// fields) in mesh order. Entities outside the field's support hold
    /// NaN. The attribute takes the field's base name.
    pub fn map_to_entities(field: &ResultField, mesh: &Mesh) -> Result<DenseAttribute> {
        let (count, position): (usize, fn(&Mesh, i32) -> Option<usize>) = match field.location() {
            ResultLocation::Nodal => (mesh.node_count(), Mesh::node_position),
            ResultLocation::Elemental => (mesh.element_count(), Mesh::element_position),
            other => return Err(TranslateError::UnsupportedLocation(other)),
        };

        let mut attribute = DenseAttribute::undefined(
            field.base_name(),
            field.location(),
            field.components(),
            count,
        );

        let mut unknown = 0;
        for (id, values) in field.iter() {
            match position(mesh, id) {
                Some(index) => attribute.set(index, values),
                None => unknown += 1,
            }
        }

        if unknown > 0 {
            warn!(
                "{}: {} supported ids are not in the mesh and were skipped",
                field.name(),
                unknown
            );
        }
        debug!(
            "mapped {} onto {} {} entities ({} defined)",
            field.name(),
            count,
            field.location(),
            attribute.defined_count()
        );
        Ok(attribute)
    }
}
