//! End-to-end merge: boundary + feasibility, build, normalize, subset,
//! plan, commit.

use std::path::PathBuf;
use std::sync::Arc;

use boundary::{resolve_boundary, RegionOfInterest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sst_common::TimeGap;

use crate::config::MergeConfig;
use crate::dataset::VirtualDatasetBuilder;
use crate::encode::{EncodingPlan, Provenance};
use crate::error::{MergeError, Result};
use crate::events::{MergeEvent, MergeObserver, Stage, StageTimer, TracingObserver};
use crate::feasibility::{FeasibilityGate, FeasibilityReport};
use crate::graph::{CancelToken, Scheduler, TaskGraph};
use crate::normalize::normalize;
use crate::source::{NetCdfSource, RasterSource};
use crate::subset::{subset, EmptySelection, Selection};
use crate::writer::NetCdfWriter;

/// What to merge and where to put it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRequest {
    /// Input files in concatenation order.
    pub input_files: Vec<PathBuf>,
    /// Vector boundary file.
    pub boundary: PathBuf,
    pub output: PathBuf,
    pub buffer_degrees: f64,
}

/// Summary of a committed merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub output: PathBuf,
    pub bytes_written: u64,
    pub file_count: usize,
    pub time_steps: usize,
    pub rows: usize,
    pub cols: usize,
    pub variables: Vec<String>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub gaps: Vec<TimeGap>,
    pub duplicates_dropped: usize,
    pub region: RegionOfInterest,
    /// Horizontal axis names found in the inputs.
    pub lon_source: String,
    pub lat_source: String,
    pub feasibility: FeasibilityReport,
    pub chunks_written: usize,
    /// Peak chunk-buffer bytes held at once.
    pub peak_chunk_bytes: usize,
}

impl MergeReport {
    /// Total missing sampling intervals over all gaps.
    pub fn missing_intervals(&self) -> u64 {
        self.gaps.iter().map(|g| g.missing).sum()
    }
}

/// How a merge ended, when it did not fail.
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    /// The output file was written.
    Committed(MergeReport),
    /// The box selected nothing; no file was written.
    Empty(EmptySelection),
}

/// The merge engine.
pub struct MergePipeline {
    config: MergeConfig,
    source: Arc<dyn RasterSource>,
    observer: Arc<dyn MergeObserver>,
    cancel: CancelToken,
}

impl MergePipeline {
    /// Pipeline reading NetCDF from disk and logging through `tracing`.
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            source: Arc::new(NetCdfSource),
            observer: Arc::new(TracingObserver),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn RasterSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn MergeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this pipeline's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Run a merge on a dedicated pool of `config.workers` threads.
    pub fn run(&self, request: &MergeRequest) -> Result<MergeOutcome> {
        self.config.validate().map_err(MergeError::Config)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("sst-merge-{}", i))
            .build()
            .map_err(|e| MergeError::Config(format!("failed to start worker pool: {}", e)))?;

        pool.install(|| self.run_on_pool(request))
    }

    fn run_on_pool(&self, request: &MergeRequest) -> Result<MergeOutcome> {
        let source = self.source.as_ref();
        let observer = self.observer.as_ref();
        let config = &self.config;

        let gate = FeasibilityGate::new(
            source,
            &config.feasibility,
            &config.time_dimension,
            observer,
        );
        let (region, feasibility) = rayon::join(
            || {
                let _timer = StageTimer::start(observer, Stage::Boundary);
                resolve_boundary(&request.boundary, request.buffer_degrees)
            },
            || gate.check(&request.input_files),
        );

        let region = region?;
        observer.on_event(&MergeEvent::BoundaryResolved {
            raw: region.raw,
            bounds: region.bounds,
        });
        if !feasibility.feasible {
            return Err(MergeError::Infeasible {
                reason: feasibility.reasons.join("; "),
            });
        }

        let dataset =
            VirtualDatasetBuilder::new(source, config, observer).build(&request.input_files)?;
        let normalized = normalize(dataset, observer)?;
        let subset = match subset(normalized, &region.bounds, config.sampling_interval(), observer)
        {
            Selection::Subset(subset) => subset,
            Selection::Empty(empty) => return Ok(MergeOutcome::Empty(empty)),
        };

        self.check_memory_limit()?;

        let graph = {
            let _timer = StageTimer::start(observer, Stage::Plan);
            TaskGraph::plan(&subset, config.chunk_policy)
        };
        observer.on_event(&MergeEvent::ChunksPlanned {
            tasks: graph.len(),
            reads: graph.read_count(),
            max_chunk_bytes: graph.max_chunk_bytes(),
        });

        if self.cancel.is_cancelled() {
            return Err(MergeError::Cancelled);
        }

        let _timer = StageTimer::start(observer, Stage::Commit);
        let provenance = Provenance::new(
            &config.provenance,
            request.input_files.len(),
            &region.bounds,
            region.buffer_degrees,
            Utc::now(),
        );
        let plan = EncodingPlan::new(&subset, &config.output, provenance);

        let mut writer = NetCdfWriter::create(&request.output, &subset, &plan)?;
        let stats = Scheduler::new(source, config.workers, &self.cancel, observer).run(
            &graph,
            &subset,
            &mut writer,
        )?;
        let bytes_written = writer.finish()?;

        observer.on_event(&MergeEvent::Committed {
            path: request.output.clone(),
            bytes: bytes_written,
            peak_chunk_bytes: stats.pool.peak_bytes,
        });

        let [time_steps, rows, cols] = subset.shape();
        Ok(MergeOutcome::Committed(MergeReport {
            output: request.output.clone(),
            bytes_written,
            file_count: request.input_files.len(),
            time_steps,
            rows,
            cols,
            variables: subset.variable_names(),
            time_range: subset.time_range(),
            duplicates_dropped: subset.duplicates_dropped,
            region,
            lon_source: subset.source.lon_source.clone(),
            lat_source: subset.source.lat_source.clone(),
            feasibility,
            chunks_written: stats.chunks_written,
            peak_chunk_bytes: stats.pool.peak_bytes,
            gaps: subset.gaps,
        }))
    }

    fn check_memory_limit(&self) -> Result<()> {
        let Some(limit) = self.config.memory_limit_bytes() else {
            return Ok(());
        };
        let estimate = self.config.estimated_peak_bytes();
        if estimate > limit {
            return Err(MergeError::resource(format!(
                "estimated peak of {} bytes ({} workers x {} chunk x 2) exceeds the memory limit of {} bytes",
                estimate, self.config.workers, self.config.chunk_policy, limit
            )));
        }
        Ok(())
    }
}
