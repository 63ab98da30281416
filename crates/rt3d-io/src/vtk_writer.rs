//! Legacy VTK writer for ParaView visualization
//!
//! Writes a (deformed) mesh as an ASCII `UNSTRUCTURED_GRID`, optionally with
//! one dense attribute as point data (nodal) or cell data (elemental).
//! Points are written in shortest round-trip form so reading the file back
//! reproduces the coordinates exactly.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rt3d_io::{FrdFile, VtkWriter};
//!
//! let frd = FrdFile::from_file("job.frd")?;
//! VtkWriter::new(&frd.mesh).write("job.vtk")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use rt3d_model::{DenseAttribute, ElementShape, Mesh, ResultLocation};
use tracing::debug;

use crate::atomic::write_atomic;
use crate::error::{IoError, Result};

/// VTK element type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VtkCellType {
    Line = 3,
    Triangle = 5,
    Quad = 9,
    Tetra = 10,
    Hexahedron = 12,
    Wedge = 13,
    QuadraticEdge = 21,
    QuadraticTriangle = 22,
    QuadraticQuad = 23,
    QuadraticTetra = 24,
    QuadraticHexahedron = 25,
    QuadraticWedge = 26,
}

impl From<ElementShape> for VtkCellType {
    fn from(shape: ElementShape) -> Self {
        match shape {
            ElementShape::Hex8 => VtkCellType::Hexahedron,
            ElementShape::Wedge6 => VtkCellType::Wedge,
            ElementShape::Tet4 => VtkCellType::Tetra,
            ElementShape::Hex20 => VtkCellType::QuadraticHexahedron,
            ElementShape::Wedge15 => VtkCellType::QuadraticWedge,
            ElementShape::Tet10 => VtkCellType::QuadraticTetra,
            ElementShape::Tri3 => VtkCellType::Triangle,
            ElementShape::Tri6 => VtkCellType::QuadraticTriangle,
            ElementShape::Quad4 => VtkCellType::Quad,
            ElementShape::Quad8 => VtkCellType::QuadraticQuad,
            ElementShape::Beam2 => VtkCellType::Line,
            ElementShape::Beam3 => VtkCellType::QuadraticEdge,
        }
    }
}

/// VTK writer for a mesh and an optional attribute
pub struct VtkWriter<'a> {
    mesh: &'a Mesh,
    attribute: Option<&'a DenseAttribute>,
    title: String,
}

impl<'a> VtkWriter<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            attribute: None,
            title: "rt3d result".to_string(),
        }
    }

    pub fn with_attribute(mut self, attribute: Option<&'a DenseAttribute>) -> Self {
        self.attribute = attribute;
        self
    }

    /// Title line of the file; line breaks are replaced
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into().replace(['\n', '\r'], " ");
        self
    }

    /// Write the legacy VTK file to `path`
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        self.check_attribute()?;
        let cells = self.cell_connectivity()?;
        let written = write_atomic(path, |w| {
            self.write_header(w)?;
            self.write_points(w)?;
            self.write_cells(w, &cells)?;
            self.write_attribute(w)
        })?;
        debug!(
            "wrote VTK file {:?}: {} points, {} cells",
            written,
            self.mesh.node_count(),
            cells.len()
        );
        Ok(written)
    }

    fn check_attribute(&self) -> Result<()> {
        let Some(attribute) = self.attribute else {
            return Ok(());
        };
        let expected = match attribute.location {
            ResultLocation::Nodal => self.mesh.node_count(),
            ResultLocation::Elemental => self.mesh.element_count(),
            ResultLocation::ElementNodal => {
                return Err(IoError::InvalidData(format!(
                    "attribute {} has {} location, which VTK output cannot carry",
                    attribute.name, attribute.location
                )));
            }
        };
        if attribute.len() != expected || attribute.components == 0 {
            return Err(IoError::InvalidData(format!(
                "attribute {} covers {} entities, mesh has {}",
                attribute.name,
                attribute.len(),
                expected
            )));
        }
        Ok(())
    }

    /// Node positions of every element, in mesh order
    fn cell_connectivity(&self) -> Result<Vec<(VtkCellType, Vec<usize>)>> {
        self.mesh
            .elements()
            .iter()
            .map(|element| {
                let nodes = element
                    .nodes
                    .iter()
                    .map(|&id| {
                        self.mesh.node_position(id).ok_or_else(|| {
                            IoError::InvalidData(format!(
                                "element {} references unknown node {}",
                                element.id, id
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((VtkCellType::from(element.shape), nodes))
            })
            .collect()
    }

    fn write_header(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "# vtk DataFile Version 3.0")?;
        writeln!(w, "{}", self.title)?;
        writeln!(w, "ASCII")?;
        writeln!(w, "DATASET UNSTRUCTURED_GRID")
    }

    fn write_points(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "POINTS {} double", self.mesh.node_count())?;
        for node in self.mesh.nodes() {
            writeln!(
                w,
                "{} {} {}",
                format_value(node.x),
                format_value(node.y),
                format_value(node.z)
            )?;
        }
        Ok(())
    }

    fn write_cells(&self, w: &mut dyn Write, cells: &[(VtkCellType, Vec<usize>)]) -> io::Result<()> {
        let total_size: usize = cells.iter().map(|(_, nodes)| 1 + nodes.len()).sum();
        writeln!(w, "CELLS {} {}", cells.len(), total_size)?;
        for (_, nodes) in cells {
            write!(w, "{}", nodes.len())?;
            for index in nodes {
                write!(w, " {}", index)?;
            }
            writeln!(w)?;
        }

        writeln!(w, "CELL_TYPES {}", cells.len())?;
        for (cell_type, _) in cells {
            writeln!(w, "{}", *cell_type as i32)?;
        }
        Ok(())
    }

    fn write_attribute(&self, w: &mut dyn Write) -> io::Result<()> {
        let Some(attribute) = self.attribute else {
            return Ok(());
        };

        let section = match attribute.location {
            ResultLocation::Elemental => "CELL_DATA",
            _ => "POINT_DATA",
        };
        let name = array_name(&attribute.name);
        writeln!(w, "{} {}", section, attribute.len())?;

        match attribute.components {
            1 => {
                writeln!(w, "SCALARS {} double 1", name)?;
                writeln!(w, "LOOKUP_TABLE default")?;
            }
            3 => writeln!(w, "VECTORS {} double", name)?,
            n => {
                writeln!(w, "FIELD FieldData 1")?;
                writeln!(w, "{} {} {} double", name, n, attribute.len())?;
            }
        }

        for index in 0..attribute.len() {
            let line = attribute
                .get(index)
                .unwrap_or_default()
                .iter()
                .map(|&v| format_value(v))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(w, "{}", line)?;
        }
        Ok(())
    }
}

/// Shortest round-trip text of `value`; NaN is written as `nan`
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        value.to_string()
    }
}

/// VTK array names cannot contain whitespace
fn array_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "values".to_string()
    } else {
        cleaned
    }
}

/// Read the `POINTS` section of a legacy ASCII VTK file
pub fn read_vtk_points<P: AsRef<Path>>(path: P) -> Result<Vec<Point3<f64>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }
    parse_vtk_points(&fs::read_to_string(path)?)
}

fn parse_vtk_points(raw: &str) -> Result<Vec<Point3<f64>>> {
    let mut lines = raw.lines().enumerate();

    let (header_no, count) = loop {
        let Some((index, line)) = lines.next() else {
            return Err(IoError::InvalidData("no POINTS section".to_string()));
        };
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some("POINTS") {
            let count = tokens
                .next()
                .and_then(|t| t.parse::<usize>().ok())
                .ok_or_else(|| IoError::parse(index + 1, "invalid POINTS count"))?;
            break (index + 1, count);
        }
    };

    let mut values = Vec::with_capacity(count * 3);
    let mut last_line = header_no;
    for (index, line) in lines {
        if values.len() == count * 3 {
            break;
        }
        last_line = index + 1;
        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| {
                IoError::parse(index + 1, format!("invalid coordinate {:?}", token))
            })?;
            values.push(value);
        }
    }

    if values.len() < count * 3 {
        return Err(IoError::parse(
            last_line,
            format!("expected {} coordinates, found {}", count * 3, values.len()),
        ));
    }

    Ok(values
        .chunks_exact(3)
        .take(count)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect())
}
