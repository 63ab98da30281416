//! Error types for rt3d-translate

use std::fmt;
use std::path::PathBuf;

use rt3d_io::IoError;
use rt3d_model::ResultLocation;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TranslateError>;

/// Every input of a request form that was missing or malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub missing: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing input, please specify a value for each input: {}",
            self.missing.join(", ")
        )
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Result not found: {0}")]
    ResultNotFound(String),

    #[error("Degenerate displacement field {field}: peak magnitude is {peak}")]
    DegenerateField { field: String, peak: f64 },

    #[error("Field {field} has {found} components per entity, expected {expected}")]
    ComponentMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported result location: {0}")]
    UnsupportedLocation(ResultLocation),

    #[error("Unsupported result type: {0:?}")]
    UnsupportedResultKind(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] IoError),
}

impl TranslateError {
    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        TranslateError::ResultNotFound(message.into())
    }

    /// Suggestion shown to the user next to the error
    pub fn hint(&self) -> &'static str {
        match self {
            TranslateError::Validation(_) => "Specify a value for each input",
            TranslateError::ResultNotFound(_) => {
                "Change the requested result type, number, or the file"
            }
            TranslateError::DegenerateField { .. } => {
                "Pick a result set with nonzero displacement or use 0 percent deflection"
            }
            TranslateError::ComponentMismatch { .. } | TranslateError::UnsupportedLocation(_) => {
                "The result file stores this quantity in a layout that cannot be translated"
            }
            TranslateError::UnsupportedResultKind(_) => {
                "Use one of u, ux, uy, uz, usum, sx, sy, sz, xy, xz, yz, s1, s2, s3, seqv or tmp"
            }
            TranslateError::UnsupportedFormat(_) => "Use one of vtk, stl, obj, wrl or none",
            TranslateError::Config { .. } => "Fix or remove the configuration file",
            TranslateError::Io(_) => "Check the result file and the output directory",
        }
    }
}
