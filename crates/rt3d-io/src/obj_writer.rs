//! Wavefront OBJ output with result colors.
//!
//! Nodal attributes become per-vertex colors (`v x y z r g b`). Elemental
//! attributes are split into color bands, one material per band in a sibling
//! `.mtl` file, with faces grouped under `usemtl`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rt3d_model::{DenseAttribute, Mesh, ResultLocation};
use tracing::{info, warn};

use crate::atomic::{AtomicFile, write_atomic};
use crate::colormap::{ColorScale, UNDEFINED_COLOR};
use crate::error::{IoError, Result};
use crate::surface::{Surface, Triangle};

pub const DEFAULT_COLOR_BANDS: usize = 10;

const UNDEFINED_MATERIAL: &str = "undefined";

/// OBJ writer for a mesh surface and an optional attribute
pub struct ObjWriter<'a> {
    mesh: &'a Mesh,
    attribute: Option<&'a DenseAttribute>,
    bands: usize,
}

impl<'a> ObjWriter<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            attribute: None,
            bands: DEFAULT_COLOR_BANDS,
        }
    }

    pub fn with_attribute(mut self, attribute: Option<&'a DenseAttribute>) -> Self {
        self.attribute = attribute;
        self
    }

    /// Number of materials used for elemental attributes
    pub fn with_color_bands(mut self, bands: usize) -> Self {
        self.bands = bands.max(1);
        self
    }

    /// Write the OBJ file (and its `.mtl` for elemental attributes)
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let surface = Surface::extract(self.mesh);
        if surface.triangles.is_empty() {
            return Err(IoError::InvalidData(
                "mesh has no surface faces to write as OBJ".to_string(),
            ));
        }

        let written = match self.attribute {
            None => {
                let mut obj = AtomicFile::create(path)?;
                obj.write_with(|w| {
                    write_header(w, None)?;
                    write_vertices(w, &surface, None)?;
                    write_faces(w, surface.triangles.iter())
                })?;
                obj.commit()?
            }
            Some(attribute) => match attribute.location {
                ResultLocation::Nodal => self.write_vertex_colors(path, &surface, attribute)?,
                ResultLocation::Elemental => self.write_materials(path, &surface, attribute)?,
                ResultLocation::ElementNodal => {
                    return Err(IoError::InvalidData(format!(
                        "attribute {} has {} location, which OBJ output cannot carry",
                        attribute.name, attribute.location
                    )));
                }
            },
        };

        info!(
            "Saved {} triangles to {:?} (OBJ format)",
            surface.triangle_count(),
            written
        );
        Ok(written)
    }

    fn write_vertex_colors(
        &self,
        path: &Path,
        surface: &Surface,
        attribute: &DenseAttribute,
    ) -> Result<PathBuf> {
        check_len(attribute, self.mesh.node_count())?;
        let scale = ColorScale::for_attribute(attribute);

        let mut obj = AtomicFile::create(path)?;
        obj.write_with(|w| {
            write_header(w, Some((attribute, scale)))?;
            let color_of: &dyn Fn(usize) -> [f32; 3] = &|i| match scale {
                Some(scale) => scale.color(attribute.magnitude(i)),
                None => UNDEFINED_COLOR,
            };
            write_vertices(w, surface, Some(color_of))?;
            write_faces(w, surface.triangles.iter())
        })?;
        obj.commit()
    }

    fn write_materials(
        &self,
        path: &Path,
        surface: &Surface,
        attribute: &DenseAttribute,
    ) -> Result<PathBuf> {
        check_len(attribute, self.mesh.element_count())?;
        let scale = ColorScale::for_attribute(attribute);
        let bands = self.bands;

        // Faces grouped by band, undefined elements last
        let mut groups: Vec<Vec<&Triangle>> = vec![Vec::new(); bands + 1];
        for triangle in &surface.triangles {
            let band = scale
                .and_then(|s| s.band(attribute.magnitude(triangle.element), bands))
                .unwrap_or(bands);
            groups[band].push(triangle);
        }

        let mtl_path = path.with_extension("mtl");
        let mtl_name = mtl_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "materials.mtl".to_string());

        let mut mtl = AtomicFile::create(&mtl_path)?;
        mtl.write_with(|w| {
            writeln!(w, "# rt3d materials for {}", attribute.name)?;
            for band in 0..bands {
                let color = match scale {
                    Some(scale) => scale.band_color(band, bands),
                    None => UNDEFINED_COLOR,
                };
                write_material(w, &band_material(band), color)?;
            }
            write_material(w, UNDEFINED_MATERIAL, UNDEFINED_COLOR)
        })?;

        let mut obj = AtomicFile::create(path)?;
        obj.write_with(|w| {
            write_header(w, Some((attribute, scale)))?;
            writeln!(w, "mtllib {}", mtl_name)?;
            write_vertices(w, surface, None)?;
            for (band, triangles) in groups.iter().enumerate() {
                if triangles.is_empty() {
                    continue;
                }
                let material = if band < bands {
                    band_material(band)
                } else {
                    UNDEFINED_MATERIAL.to_string()
                };
                writeln!(w, "usemtl {}", material)?;
                write_faces(w, triangles.iter().copied())?;
            }
            Ok(())
        })?;

        // Both files are fully rendered; publish the material library first
        // and put the previous one back if the OBJ cannot follow
        let previous_mtl = fs::read(&mtl_path).ok();
        mtl.commit()?;
        obj.commit().inspect_err(|err| {
            warn!("{:?} not written ({}), rolling back {:?}", path, err, mtl_path);
            let restored = match &previous_mtl {
                Some(contents) => write_atomic(&mtl_path, |w| w.write_all(contents)).map(drop),
                None => fs::remove_file(&mtl_path).map_err(IoError::from),
            };
            if let Err(rollback) = restored {
                warn!("could not roll back {:?}: {}", mtl_path, rollback);
            }
        })
    }
}

fn check_len(attribute: &DenseAttribute, expected: usize) -> Result<()> {
    if attribute.len() != expected {
        return Err(IoError::InvalidData(format!(
            "attribute {} covers {} entities, mesh has {}",
            attribute.name,
            attribute.len(),
            expected
        )));
    }
    Ok(())
}

fn band_material(band: usize) -> String {
    format!("band_{}", band)
}

fn write_header(
    w: &mut dyn Write,
    attribute: Option<(&DenseAttribute, Option<ColorScale>)>,
) -> io::Result<()> {
    writeln!(w, "# OBJ file exported by rt3d")?;
    if let Some((attribute, scale)) = attribute {
        writeln!(w, "# attribute: {} ({})", attribute.name, attribute.location)?;
        match scale {
            Some(scale) => writeln!(w, "# range: {} {}", scale.min, scale.max)?,
            None => writeln!(w, "# range: undefined")?,
        }
    }
    Ok(())
}

fn write_vertices(
    w: &mut dyn Write,
    surface: &Surface,
    colors: Option<&dyn Fn(usize) -> [f32; 3]>,
) -> io::Result<()> {
    for (i, v) in surface.vertices.iter().enumerate() {
        match colors {
            Some(color_of) => {
                let [r, g, b] = color_of(i);
                writeln!(w, "v {} {} {} {:.4} {:.4} {:.4}", v.x, v.y, v.z, r, g, b)?;
            }
            None => writeln!(w, "v {} {} {}", v.x, v.y, v.z)?,
        }
    }
    Ok(())
}

fn write_faces<'t>(
    w: &mut dyn Write,
    triangles: impl Iterator<Item = &'t Triangle>,
) -> io::Result<()> {
    for triangle in triangles {
        let [a, b, c] = triangle.vertices;
        // OBJ indices are 1-based
        writeln!(w, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}

fn write_material(w: &mut dyn Write, name: &str, [r, g, b]: [f32; 3]) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "newmtl {}", name)?;
    writeln!(w, "Kd {:.4} {:.4} {:.4}", r, g, b)?;
    writeln!(w, "Ka 0 0 0")?;
    writeln!(w, "d 1")
}
