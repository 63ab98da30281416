//! Translation requests and their validation.

use std::path::{Path, PathBuf};

use crate::error::ValidationError;
use crate::export::FormatChoice;
use crate::kind::ResultKind;

/// Raw request inputs as collected from the user, possibly incomplete
#[derive(Debug, Clone, Default)]
pub struct RequestForm {
    pub result_set: Option<String>,
    pub percent: Option<String>,
    pub result_kind: Option<String>,
    pub result_file: Option<PathBuf>,
    pub output_format: Option<String>,
    pub output_root: Option<String>,
    pub plot: bool,
}

impl RequestForm {
    /// Check every input, reporting all problems at once
    pub fn validate(&self) -> Result<TranslationRequest, ValidationError> {
        let mut missing = Vec::new();

        let result_set = match present(&self.result_set) {
            None => {
                missing.push("Result Set Number".to_string());
                None
            }
            Some(raw) => match raw.parse::<u32>() {
                Ok(set) if set > 0 => Some(set),
                _ => {
                    missing.push(format!(
                        "Result Set Number (expected a positive integer, got {:?})",
                        raw
                    ));
                    None
                }
            },
        };

        let percent = match present(&self.percent) {
            None => {
                missing.push("Percent Deflection Distortion".to_string());
                None
            }
            Some(raw) => match raw.parse::<f64>() {
                Ok(p) if p.is_finite() && p >= 0.0 => Some(p),
                _ => {
                    missing.push(format!(
                        "Percent Deflection Distortion (expected a non-negative number, got {:?})",
                        raw
                    ));
                    None
                }
            },
        };

        let kind = match present(&self.result_kind) {
            None => {
                missing.push("Result Type".to_string());
                None
            }
            Some(raw) => match raw.parse::<ResultKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    let known = ResultKind::ALL.map(|k| k.keyword()).join(", ");
                    missing.push(format!("Result Type ({:?} is not one of {})", raw, known));
                    None
                }
            },
        };

        let archive = match &self.result_file {
            Some(path) if !path.as_os_str().is_empty() => Some(path.clone()),
            _ => {
                missing.push("Result File".to_string());
                None
            }
        };

        let format = match present(&self.output_format) {
            None => {
                missing.push("Output File Type".to_string());
                None
            }
            Some(raw) => match raw.parse::<FormatChoice>() {
                Ok(format) => Some(format),
                Err(_) => {
                    missing.push(format!(
                        "Output File Type ({:?} is not one of vtk, stl, obj, wrl, none)",
                        raw
                    ));
                    None
                }
            },
        };

        let output_root = match present(&self.output_root) {
            None => {
                missing.push("Output File Root".to_string());
                None
            }
            Some(raw) if raw.contains(['/', '\\']) => {
                missing.push(format!(
                    "Output File Root (must be a file name, got {:?})",
                    raw
                ));
                None
            }
            Some(raw) => Some(raw.to_string()),
        };

        match (result_set, percent, kind, archive, format, output_root) {
            (
                Some(result_set),
                Some(percent),
                Some(kind),
                Some(archive),
                Some(format),
                Some(output_root),
            ) if missing.is_empty() => Ok(TranslationRequest {
                archive,
                result_set,
                kind,
                percent,
                format,
                output_root,
                plot: self.plot,
            }),
            _ => Err(ValidationError { missing }),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validated, immutable translation request
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    archive: PathBuf,
    result_set: u32,
    kind: ResultKind,
    percent: f64,
    format: FormatChoice,
    output_root: String,
    plot: bool,
}

impl TranslationRequest {
    /// Result archive the request reads
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn result_set(&self) -> u32 {
        self.result_set
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Deflection as a percentage of the mesh size, 0 for undeformed
    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn format(&self) -> FormatChoice {
        self.format
    }

    pub fn output_root(&self) -> &str {
        &self.output_root
    }

    pub fn plot(&self) -> bool {
        self.plot
    }

    /// `<root>-<kind>-<set>.<ext>`, `None` when no file is requested
    pub fn output_file_name(&self) -> Option<String> {
        self.format.format().map(|format| {
            format!(
                "{}-{}-{}.{}",
                self.output_root,
                self.kind.keyword(),
                self.result_set,
                format.extension()
            )
        })
    }

    /// Output file in `dir`, or next to the archive when `dir` is `None`
    pub fn output_path(&self, dir: Option<&Path>) -> Option<PathBuf> {
        let name = self.output_file_name()?;
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => self
                .archive
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        Some(dir.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::OutputFormat;

    fn complete() -> RequestForm {
        RequestForm {
            result_set: Some("2".to_string()),
            percent: Some("10".to_string()),
            result_kind: Some("seqv".to_string()),
            result_file: Some(PathBuf::from("runs/beam.frd")),
            output_format: Some("obj".to_string()),
            output_root: Some("beam".to_string()),
            plot: true,
        }
    }

    #[test]
    fn complete_form_validates() {
        let request = complete().validate().unwrap();
        assert_eq!(request.result_set(), 2);
        assert_eq!(request.kind(), ResultKind::Seqv);
        assert_eq!(request.format(), FormatChoice::Export(OutputFormat::Obj));
        assert!(request.plot());
        assert_eq!(
            request.output_path(None),
            Some(PathBuf::from("runs/beam-seqv-2.obj"))
        );
        assert_eq!(
            request.output_path(Some(Path::new("/tmp/out"))),
            Some(PathBuf::from("/tmp/out/beam-seqv-2.obj"))
        );
    }

    #[test]
    fn every_missing_input_is_listed() {
        let err = RequestForm::default().validate().unwrap_err();
        assert_eq!(
            err.missing,
            vec![
                "Result Set Number",
                "Percent Deflection Distortion",
                "Result Type",
                "Result File",
                "Output File Type",
                "Output File Root",
            ]
        );
    }

    #[test]
    fn malformed_inputs_are_listed() {
        let form = RequestForm {
            result_set: Some("0".to_string()),
            percent: Some("-5".to_string()),
            result_kind: Some("sxx".to_string()),
            output_format: Some("ply".to_string()),
            ..complete()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.missing.len(), 4);
        assert!(err.missing[0].starts_with("Result Set Number"));
        assert!(err.missing[3].starts_with("Output File Type"));
    }

    #[test]
    fn none_format_has_no_output_file() {
        let form = RequestForm {
            output_format: Some("none".to_string()),
            ..complete()
        };
        let request = form.validate().unwrap();
        assert_eq!(request.output_file_name(), None);
        assert_eq!(request.output_path(None), None);
    }

    #[test]
    fn archive_without_directory_writes_to_cwd() {
        let form = RequestForm {
            result_file: Some(PathBuf::from("beam.frd")),
            output_format: Some("vtk".to_string()),
            ..complete()
        };
        let request = form.validate().unwrap();
        assert_eq!(
            request.output_path(None),
            Some(PathBuf::from("./beam-seqv-2.vtk"))
        );
    }
}
