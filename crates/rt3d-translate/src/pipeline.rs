//! Translation pipeline.
//!
//! One request runs synchronously through
//! `Idle → FieldSelected → (Scaled → Deformed) → Mapped → Exported → Idle`.
//! Any failure goes to `Failed`, is reported to the progress sink and the
//! pipeline returns to `Idle` without leaving an output file behind.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rt3d_io::FrdFile;
use rt3d_model::{Mesh, ResultField, ResultRepository};
use tracing::{debug, info, warn};

use crate::config::TranslatorConfig;
use crate::deformer::MeshDeformer;
use crate::error::{Result, TranslateError};
use crate::export::{FormatChoice, FormatExporter};
use crate::kind::ResultKind;
use crate::mapper::FieldMapper;
use crate::preview::{LogPreviewer, Previewer, Scene};
use crate::progress::ProgressSink;
use crate::request::TranslationRequest;
use crate::scaler::DeflectionScaler;
use crate::selector::FieldSelector;

const RULE: &str = "===========================================================================";
const THIN_RULE: &str = "---------------------------------------------------------------------------";
const ERROR_RULE: &str = "###########################################################################";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    FieldSelected,
    Scaled,
    Deformed,
    Mapped,
    Exported,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::FieldSelected => "field-selected",
            PipelineState::Scaled => "scaled",
            PipelineState::Deformed => "deformed",
            PipelineState::Mapped => "mapped",
            PipelineState::Exported => "exported",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful request
#[derive(Debug, Clone)]
pub struct TranslationReport {
    /// Written file, `None` for format `none`
    pub output: Option<PathBuf>,
    /// Deflection scale factor, `None` when the mesh was not deformed
    pub scale_factor: Option<f64>,
    /// Selected field name
    pub field: String,
    /// Entities carrying a value / entities in the attribute
    pub defined: usize,
    pub entities: usize,
    /// States visited, starting and ending at `Idle`
    pub states: Vec<PipelineState>,
    pub started_at: DateTime<Utc>,
}

/// Orchestrates selection, deformation, mapping and export of one request
pub struct TranslationPipeline {
    config: TranslatorConfig,
    previewer: Box<dyn Previewer>,
}

impl Default for TranslationPipeline {
    fn default() -> Self {
        Self::new(TranslatorConfig::default())
    }
}

impl TranslationPipeline {
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            config,
            previewer: Box::new(LogPreviewer),
        }
    }

    pub fn with_previewer(mut self, previewer: Box<dyn Previewer>) -> Self {
        self.previewer = previewer;
        self
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Open the request's `.frd` archive and translate it
    pub fn run_file(
        &self,
        request: &TranslationRequest,
        sink: &mut dyn ProgressSink,
    ) -> Result<TranslationReport> {
        let started_at = Utc::now();
        self.banner(request, sink);
        let archive = match FrdFile::from_file(request.archive()) {
            Ok(archive) => archive,
            Err(err) => return Err(self.fail(err.into(), sink)),
        };
        self.translate(request, &archive, sink, started_at)
    }

    /// Translate `request` against an already opened archive
    pub fn run(
        &self,
        request: &TranslationRequest,
        archive: &dyn ResultRepository,
        sink: &mut dyn ProgressSink,
    ) -> Result<TranslationReport> {
        let started_at = Utc::now();
        self.banner(request, sink);
        self.translate(request, archive, sink, started_at)
    }

    fn translate(
        &self,
        request: &TranslationRequest,
        archive: &dyn ResultRepository,
        sink: &mut dyn ProgressSink,
        started_at: DateTime<Utc>,
    ) -> Result<TranslationReport> {
        let mut states = vec![PipelineState::Idle];
        match self.execute(request, archive, sink, &mut states) {
            Ok(mut report) => {
                states.push(PipelineState::Idle);
                debug!(
                    "pipeline states: {}",
                    states
                        .iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<_>>()
                        .join(" -> ")
                );
                report.states = states;
                report.started_at = started_at;
                let elapsed = Utc::now() - started_at;
                info!(
                    "translation finished in {} ms",
                    elapsed.num_milliseconds()
                );
                sink.line("++ Done");
                Ok(report)
            }
            Err(err) => Err(self.fail(err, sink)),
        }
    }

    fn execute(
        &self,
        request: &TranslationRequest,
        archive: &dyn ResultRepository,
        sink: &mut dyn ProgressSink,
        states: &mut Vec<PipelineState>,
    ) -> Result<TranslationReport> {
        let selector = FieldSelector::new(self.config.stress_location);

        sink.line("++ Getting result information from file");
        let field = selector.select(archive, request.result_set(), request.kind())?;
        states.push(PipelineState::FieldSelected);

        let mesh = archive.mesh();
        let (deformed, scale_factor) = if request.kind().is_thermal() {
            (MeshDeformer::undeformed(&mesh), None)
        } else if request.percent() == 0.0 {
            sink.line("++ Zero deflection requested, keeping the undeformed mesh");
            (MeshDeformer::undeformed(&mesh), None)
        } else {
            sink.line("++ Calculating deflection distortion");
            let displacement = self.displacement(&selector, archive, request, &field)?;
            let factor = DeflectionScaler::new(self.config.peak_mode).scale(
                &mesh,
                &displacement,
                request.percent(),
            )?;
            states.push(PipelineState::Scaled);
            sink.line(&format!("   Scale factor: {}", factor));

            let deformed = MeshDeformer::deform(&mesh, &displacement, factor)?;
            states.push(PipelineState::Deformed);
            (deformed, Some(factor))
        };

        let attribute = FieldMapper::map_to_entities(&field, &deformed)?;
        states.push(PipelineState::Mapped);
        let defined = attribute.defined_count();
        if defined == 0 {
            warn!("{} has no value on any mesh entity", field.name());
        }

        if request.plot() {
            sink.line("++ Making plot");
            let scene = Scene::build(&deformed, Some(&attribute));
            self.previewer.show(&scene, sink);
        }

        let output = match request.format() {
            FormatChoice::Export(format) => {
                sink.line("++ Making output file");
                let path = request
                    .output_path(self.config.output_dir.as_deref())
                    .ok_or_else(|| TranslateError::UnsupportedFormat(format.to_string()))?;
                let written = FormatExporter::new(self.config.color_bands).export(
                    format,
                    &deformed,
                    Some(&attribute),
                    &path,
                )?;
                states.push(PipelineState::Exported);
                sink.line(&format!("   Wrote {}", written.display()));
                Some(written)
            }
            FormatChoice::None => {
                sink.line("++ No output file requested");
                None
            }
        };

        Ok(TranslationReport {
            output,
            scale_factor,
            field: field.name().to_string(),
            defined,
            entities: attribute.len(),
            states: Vec::new(),
            started_at: Utc::now(),
        })
    }

    /// Displacement field driving the deformation
    fn displacement(
        &self,
        selector: &FieldSelector,
        archive: &dyn ResultRepository,
        request: &TranslationRequest,
        selected: &ResultField,
    ) -> Result<ResultField> {
        if request.kind() == ResultKind::U {
            return Ok(selected.clone());
        }
        selector.select(archive, request.result_set(), ResultKind::U)
    }

    fn banner(&self, request: &TranslationRequest, sink: &mut dyn ProgressSink) {
        let output = request
            .output_file_name()
            .unwrap_or_else(|| "none".to_string());
        sink.line(RULE);
        sink.line("Starting the translation of your results to a different file format");
        sink.line(&format!("  Input file: {}", request.archive().display()));
        sink.line(&format!("  Solution Step/mode: {}", request.result_set()));
        sink.line(&format!("  Result type: {}", request.kind()));
        sink.line(&format!(
            "  Percent deflection distortion: {}",
            request.percent()
        ));
        sink.line(&format!("  Output file: {}", output));
        sink.line(&format!("  Plot before making file: {}", request.plot()));
        sink.line(THIN_RULE);
        info!(
            "translating {:?} set {} kind {} at {}% to {}",
            request.archive(),
            request.result_set(),
            request.kind(),
            request.percent(),
            output
        );
    }

    /// Report `err` and return to idle
    fn fail(&self, err: TranslateError, sink: &mut dyn ProgressSink) -> TranslateError {
        warn!("translation failed: {}", err);
        debug!("pipeline states: {} -> {}", PipelineState::Failed, PipelineState::Idle);
        sink.line(ERROR_RULE);
        sink.line("    ERROR");
        sink.line(&format!("  {}", err));
        sink.line(&format!("  {}", err.hint()));
        sink.line(ERROR_RULE);
        err
    }
}

/// Mesh summary lines for `rt3d inspect`
pub fn describe_archive(archive: &dyn ResultRepository) -> Vec<String> {
    let mesh: Mesh = archive.mesh();
    let mut lines = vec![mesh.statistics().format()];
    let physics: Vec<&str> = [rt3d_model::Physics::Structural, rt3d_model::Physics::Thermal]
        .into_iter()
        .filter(|p| archive.has_physics(*p))
        .map(|p| p.name())
        .collect();
    lines.push(format!(
        "Physics: {}",
        if physics.is_empty() {
            "none".to_string()
        } else {
            physics.join(", ")
        }
    ));
    for set in archive.result_sets() {
        let kinds: Vec<&str> = ResultKind::ALL
            .into_iter()
            .filter(|kind| archive.quantity(set, kind.quantity()).is_some())
            .map(|kind| kind.keyword())
            .collect();
        lines.push(format!("Result set {}: {}", set, kinds.join(" ")));
    }
    lines
}
