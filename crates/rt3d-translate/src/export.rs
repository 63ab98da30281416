//! Output formats and their writers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rt3d_io::{ObjWriter, VtkWriter, write_stl, write_wrl};
use rt3d_model::{DenseAttribute, Mesh};
use tracing::debug;

use crate::error::{Result, TranslateError};

/// What a format can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whole mesh including element topology, not just its surface
    pub full_mesh: bool,
    /// Result values attached to the geometry
    pub attribute: bool,
}

/// Supported 3D output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Vtk,
    Stl,
    Obj,
    Wrl,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Vtk,
        OutputFormat::Stl,
        OutputFormat::Obj,
        OutputFormat::Wrl,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Vtk => "vtk",
            OutputFormat::Stl => "stl",
            OutputFormat::Obj => "obj",
            OutputFormat::Wrl => "wrl",
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            OutputFormat::Vtk => Capabilities {
                full_mesh: true,
                attribute: true,
            },
            OutputFormat::Stl => Capabilities {
                full_mesh: false,
                attribute: false,
            },
            OutputFormat::Obj | OutputFormat::Wrl => Capabilities {
                full_mesh: false,
                attribute: true,
            },
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Requested output: a file format, or no file at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatChoice {
    Export(OutputFormat),
    None,
}

impl FormatChoice {
    pub fn format(self) -> Option<OutputFormat> {
        match self {
            FormatChoice::Export(format) => Some(format),
            FormatChoice::None => None,
        }
    }
}

impl fmt::Display for FormatChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatChoice::Export(format) => write!(f, "{}", format),
            FormatChoice::None => f.write_str("none"),
        }
    }
}

impl FromStr for FormatChoice {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "none" {
            return Ok(FormatChoice::None);
        }
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.extension() == wanted)
            .map(FormatChoice::Export)
            .ok_or_else(|| TranslateError::UnsupportedFormat(s.to_string()))
    }
}

/// Writes a deformed mesh and its attribute in one of the output formats
#[derive(Debug, Clone, Copy)]
pub struct FormatExporter {
    color_bands: usize,
}

impl Default for FormatExporter {
    fn default() -> Self {
        Self::new(rt3d_io::DEFAULT_COLOR_BANDS)
    }
}

impl FormatExporter {
    pub fn new(color_bands: usize) -> Self {
        Self { color_bands }
    }

    /// Write `mesh` to `path`. Formats that cannot carry an attribute drop
    /// it; nothing appears at `path` unless the write succeeds.
    pub fn export(
        &self,
        format: OutputFormat,
        mesh: &Mesh,
        attribute: Option<&DenseAttribute>,
        path: &Path,
    ) -> Result<PathBuf> {
        let attribute = attribute.filter(|_| format.capabilities().attribute);
        debug!(
            "exporting {} to {:?} (attribute: {})",
            format,
            path,
            attribute.map_or("none", |a| a.name.as_str())
        );

        let written = match format {
            OutputFormat::Vtk => VtkWriter::new(mesh)
                .with_title(attribute.map_or("rt3d result", |a| a.name.as_str()))
                .with_attribute(attribute)
                .write(path)?,
            OutputFormat::Stl => write_stl(mesh, path)?,
            OutputFormat::Obj => ObjWriter::new(mesh)
                .with_attribute(attribute)
                .with_color_bands(self.color_bands)
                .write(path)?,
            OutputFormat::Wrl => write_wrl(mesh, attribute, path)?,
        };
        Ok(written)
    }
}
