//! Finite element result to deformed 3D geometry translation.
//!
//! A [`TranslationPipeline`] takes one validated [`TranslationRequest`],
//! selects a result field from a [`ResultRepository`](rt3d_model::ResultRepository),
//! magnifies the displacement into a deformed copy of the mesh, maps the
//! field onto the mesh entities and writes one of the supported 3D formats.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rt3d_translate::{RequestForm, TranslationPipeline};
//!
//! let request = RequestForm {
//!     result_set: Some("1".into()),
//!     percent: Some("10".into()),
//!     result_kind: Some("usum".into()),
//!     result_file: Some("job.frd".into()),
//!     output_format: Some("vtk".into()),
//!     output_root: Some("job".into()),
//!     plot: false,
//! }
//! .validate()?;
//!
//! let mut progress: Vec<String> = Vec::new();
//! let report = TranslationPipeline::default().run_file(&request, &mut progress)?;
//! println!("wrote {:?}", report.output);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod deformer;
pub mod error;
pub mod export;
pub mod kind;
pub mod mapper;
pub mod pipeline;
pub mod preview;
pub mod progress;
pub mod request;
pub mod scaler;
pub mod selector;

pub use config::TranslatorConfig;
pub use deformer::MeshDeformer;
pub use error::{Result, TranslateError, ValidationError};
pub use export::{Capabilities, FormatChoice, FormatExporter, OutputFormat};
pub use kind::ResultKind;
pub use mapper::FieldMapper;
pub use pipeline::{PipelineState, TranslationPipeline, TranslationReport, describe_archive};
pub use preview::{LogPreviewer, Previewer, Scene, SceneColors};
pub use progress::{ProgressSink, WriterSink};
pub use request::{RequestForm, TranslationRequest};
pub use scaler::{DeflectionScaler, PeakMode};
pub use selector::{FieldSelector, StressLocation};
