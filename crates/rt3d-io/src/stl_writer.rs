//! Binary STL output of a mesh's boundary surface.
//!
//! STL carries geometry only; attributes are not representable and callers
//! drop them before writing.

use std::io;
use std::path::{Path, PathBuf};

use rt3d_model::Mesh;
use tracing::info;

use crate::atomic::write_atomic;
use crate::error::{IoError, Result};
use crate::surface::Surface;

/// Save the boundary surface of `mesh` as binary STL
pub fn write_stl<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let surface = Surface::extract(mesh);
    if surface.triangles.is_empty() {
        return Err(IoError::InvalidData(
            "mesh has no surface faces to write as STL".to_string(),
        ));
    }

    let triangles: Vec<stl_io::Triangle> = surface
        .triangles
        .iter()
        .map(|triangle| {
            let n = surface.normal(triangle);
            let [v0, v1, v2] = triangle.vertices.map(|i| surface.vertices[i]);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([v0.x as f32, v0.y as f32, v0.z as f32]),
                    stl_io::Vertex::new([v1.x as f32, v1.y as f32, v1.z as f32]),
                    stl_io::Vertex::new([v2.x as f32, v2.y as f32, v2.z as f32]),
                ],
            }
        })
        .collect();

    let written = write_atomic(path, |mut w| {
        stl_io::write_stl(&mut w, triangles.iter()).map_err(|e| io::Error::other(e.to_string()))
    })?;

    info!("Saved {} triangles to {:?}", triangles.len(), written);
    Ok(written)
}
