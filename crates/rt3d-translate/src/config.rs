//! Translator settings.
//!
//! Every field is optional in the JSON file; missing fields keep their
//! defaults.
//!
//! ```json
//! {
//!   "peak_mode": "vector-norm",
//!   "stress_location": "elemental",
//!   "output_dir": "exports",
//!   "color_bands": 12
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TranslateError};
use crate::scaler::PeakMode;
use crate::selector::StressLocation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    /// Peak displacement measure for the deflection scale
    pub peak_mode: PeakMode,
    /// Location of stress-derived fields
    pub stress_location: StressLocation,
    /// Directory for output files; the archive's directory when unset
    pub output_dir: Option<PathBuf>,
    /// Number of materials for elemental OBJ output
    pub color_bands: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            peak_mode: PeakMode::AxisMax,
            stress_location: StressLocation::Nodal,
            output_dir: None,
            color_bands: rt3d_io::DEFAULT_COLOR_BANDS,
        }
    }
}

impl TranslatorConfig {
    /// Load settings from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| Self::parse(&raw))
            .map_err(|message| TranslateError::Config {
                path: path.to_path_buf(),
                message,
            })?;
        info!("Loaded translator configuration from {:?}", path);
        Ok(config)
    }

    /// Settings from an in-memory JSON document
    pub fn from_json(raw: &str) -> Result<Self> {
        Self::parse(raw).map_err(|message| TranslateError::Config {
            path: PathBuf::from("<json>"),
            message,
        })
    }

    fn parse(raw: &str) -> std::result::Result<Self, String> {
        let config: TranslatorConfig = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        if config.color_bands == 0 {
            return Err("color_bands must be at least 1".to_string());
        }
        Ok(config)
    }
}
