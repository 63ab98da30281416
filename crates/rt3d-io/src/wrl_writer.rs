//! VRML 2.0 (`.wrl`) output with result colors.
//!
//! The surface is a single `IndexedFaceSet`. Nodal attributes color the
//! vertices (`colorPerVertex TRUE`), elemental attributes color each face
//! after its owning element (`colorPerVertex FALSE`).

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rt3d_model::{DenseAttribute, Mesh, ResultLocation};
use tracing::info;

use crate::atomic::write_atomic;
use crate::colormap::{ColorScale, UNDEFINED_COLOR};
use crate::error::{IoError, Result};
use crate::surface::Surface;

/// Save the boundary surface of `mesh` as VRML 2.0, colored by `attribute`
pub fn write_wrl<P: AsRef<Path>>(
    mesh: &Mesh,
    attribute: Option<&DenseAttribute>,
    path: P,
) -> Result<PathBuf> {
    let surface = Surface::extract(mesh);
    if surface.triangles.is_empty() {
        return Err(IoError::InvalidData(
            "mesh has no surface faces to write as VRML".to_string(),
        ));
    }

    let colors = match attribute {
        Some(attribute) => Some(face_set_colors(mesh, &surface, attribute)?),
        None => None,
    };

    let written = write_atomic(path, |w| {
        writeln!(w, "#VRML V2.0 utf8")?;
        if let Some(attribute) = attribute {
            writeln!(w, "# attribute: {} ({})", attribute.name, attribute.location)?;
        }
        writeln!(w, "Shape {{")?;
        writeln!(w, "  appearance Appearance {{ material Material {{ }} }}")?;
        writeln!(w, "  geometry IndexedFaceSet {{")?;
        writeln!(w, "    solid FALSE")?;
        write_geometry(w, &surface)?;
        if let Some((per_vertex, colors)) = &colors {
            write_colors(w, *per_vertex, colors)?;
        }
        writeln!(w, "  }}")?;
        writeln!(w, "}}")
    })?;

    info!(
        "Saved {} triangles to {:?} (VRML format)",
        surface.triangle_count(),
        written
    );
    Ok(written)
}

/// Color list and its binding: per vertex for nodal data, per face otherwise
fn face_set_colors(
    mesh: &Mesh,
    surface: &Surface,
    attribute: &DenseAttribute,
) -> Result<(bool, Vec<[f32; 3]>)> {
    let (per_vertex, expected) = match attribute.location {
        ResultLocation::Nodal => (true, mesh.node_count()),
        ResultLocation::Elemental => (false, mesh.element_count()),
        ResultLocation::ElementNodal => {
            return Err(IoError::InvalidData(format!(
                "attribute {} has {} location, which VRML output cannot carry",
                attribute.name, attribute.location
            )));
        }
    };
    if attribute.len() != expected {
        return Err(IoError::InvalidData(format!(
            "attribute {} covers {} entities, mesh has {}",
            attribute.name,
            attribute.len(),
            expected
        )));
    }

    let scale = ColorScale::for_attribute(attribute);
    let color_of = |index: usize| match scale {
        Some(scale) => scale.color(attribute.magnitude(index)),
        None => UNDEFINED_COLOR,
    };

    let colors = if per_vertex {
        (0..surface.vertices.len()).map(color_of).collect()
    } else {
        surface
            .triangles
            .iter()
            .map(|t| color_of(t.element))
            .collect()
    };
    Ok((per_vertex, colors))
}

fn write_geometry(w: &mut dyn Write, surface: &Surface) -> io::Result<()> {
    writeln!(w, "    coord Coordinate {{")?;
    writeln!(w, "      point [")?;
    for v in &surface.vertices {
        writeln!(w, "        {} {} {},", v.x, v.y, v.z)?;
    }
    writeln!(w, "      ]")?;
    writeln!(w, "    }}")?;

    writeln!(w, "    coordIndex [")?;
    for triangle in &surface.triangles {
        let [a, b, c] = triangle.vertices;
        writeln!(w, "      {}, {}, {}, -1,", a, b, c)?;
    }
    writeln!(w, "    ]")
}

fn write_colors(w: &mut dyn Write, per_vertex: bool, colors: &[[f32; 3]]) -> io::Result<()> {
    writeln!(w, "    color Color {{")?;
    writeln!(w, "      color [")?;
    for [r, g, b] in colors {
        writeln!(w, "        {:.4} {:.4} {:.4},", r, g, b)?;
    }
    writeln!(w, "      ]")?;
    writeln!(w, "    }}")?;
    writeln!(
        w,
        "    colorPerVertex {}",
        if per_vertex { "TRUE" } else { "FALSE" }
    )
}
