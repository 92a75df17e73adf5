//! Pre-flight check before any expensive work.
//!
//! Opens the first few files, then estimates the total input size as
//! `first file size x file count`. Nothing beyond the samples is opened.

use std::path::{Path, PathBuf};

use netcdf_parser::DimensionInfo;
use serde::Serialize;

use crate::config::FeasibilityConfig;
use crate::events::{MergeEvent, MergeObserver, Stage, StageTimer};
use crate::source::RasterSource;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Result of opening one sample file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SampleOutcome {
    Opened { dimensions: Vec<DimensionInfo> },
    Failed { error: String },
}

/// One sampled file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleReport {
    pub path: PathBuf,
    pub outcome: SampleOutcome,
}

impl SampleReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, SampleOutcome::Opened { .. })
    }

    /// `name=len` pairs, or the error text.
    pub fn describe(&self) -> String {
        match &self.outcome {
            SampleOutcome::Opened { dimensions } => describe_dimensions(dimensions),
            SampleOutcome::Failed { error } => error.clone(),
        }
    }
}

fn describe_dimensions(dimensions: &[DimensionInfo]) -> String {
    let parts: Vec<String> = dimensions
        .iter()
        .map(|d| format!("{}={}", d.name, d.len))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

/// Go/no-go decision with diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeasibilityReport {
    pub file_count: usize,
    pub samples: Vec<SampleReport>,
    pub first_file_bytes: Option<u64>,
    pub estimated_total_bytes: u64,
    pub ceiling_bytes: u64,
    pub feasible: bool,
    /// Why the run is not feasible; empty when it is.
    pub reasons: Vec<String>,
}

impl FeasibilityReport {
    pub fn estimated_total_gib(&self) -> f64 {
        self.estimated_total_bytes as f64 / GIB
    }
}

/// Samples inputs and estimates total size.
pub struct FeasibilityGate<'a> {
    source: &'a dyn RasterSource,
    config: &'a FeasibilityConfig,
    time_dimension: &'a str,
    observer: &'a dyn MergeObserver,
}

impl<'a> FeasibilityGate<'a> {
    pub fn new(
        source: &'a dyn RasterSource,
        config: &'a FeasibilityConfig,
        time_dimension: &'a str,
        observer: &'a dyn MergeObserver,
    ) -> Self {
        Self {
            source,
            config,
            time_dimension,
            observer,
        }
    }

    /// Check `files`. Never fails; problems end up in the report.
    pub fn check(&self, files: &[PathBuf]) -> FeasibilityReport {
        let _timer = StageTimer::start(self.observer, Stage::Feasibility);
        let mut reasons = Vec::new();

        if files.is_empty() {
            reasons.push("no input files".to_string());
        }

        let samples: Vec<SampleReport> = files
            .iter()
            .take(self.config.sample_count)
            .map(|path| self.sample(path))
            .collect();

        for sample in samples.iter().filter(|s| !s.is_ok()) {
            reasons.push(format!(
                "{} could not be opened: {}",
                file_name(&sample.path),
                sample.describe()
            ));
        }

        let first_file_bytes = match files.first() {
            Some(first) => match self.source.file_size(first) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    reasons.push(format!("size of {} unknown: {}", file_name(first), e));
                    None
                }
            },
            None => None,
        };

        let estimated_total_bytes = first_file_bytes
            .unwrap_or(0)
            .saturating_mul(files.len() as u64);
        if estimated_total_bytes > self.config.max_total_bytes {
            reasons.push(format!(
                "estimated input size {:.1} GiB ({} files x {:.2} GiB) exceeds the {:.1} GiB ceiling",
                estimated_total_bytes as f64 / GIB,
                files.len(),
                first_file_bytes.unwrap_or(0) as f64 / GIB,
                self.config.max_total_bytes as f64 / GIB
            ));
        }

        let report = FeasibilityReport {
            file_count: files.len(),
            samples,
            first_file_bytes,
            estimated_total_bytes,
            ceiling_bytes: self.config.max_total_bytes,
            feasible: reasons.is_empty(),
            reasons,
        };

        self.observer.on_event(&MergeEvent::FeasibilityChecked {
            files: report.file_count,
            estimated_bytes: report.estimated_total_bytes,
            ceiling_bytes: report.ceiling_bytes,
            feasible: report.feasible,
        });
        report
    }

    fn sample(&self, path: &Path) -> SampleReport {
        match self.source.probe(path, self.time_dimension) {
            Ok(file) => {
                let dimensions = file.dimensions;
                self.observer.on_event(&MergeEvent::SampleOpened {
                    path: path.to_path_buf(),
                    dimensions: describe_dimensions(&dimensions),
                });
                SampleReport {
                    path: path.to_path_buf(),
                    outcome: SampleOutcome::Opened { dimensions },
                }
            }
            Err(e) => {
                self.observer.on_event(&MergeEvent::SampleFailed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
                SampleReport {
                    path: path.to_path_buf(),
                    outcome: SampleOutcome::Failed {
                        error: e.to_string(),
                    },
                }
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
