//! Structured progress events.
//!
//! The engine reports what it is doing through a [`MergeObserver`]. The
//! default [`TracingObserver`] turns events into `tracing` records;
//! [`RecordingObserver`] keeps them for inspection in tests.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use sst_common::{BoundingBox, TimeGap};
use tracing::{debug, info, warn};

/// Stages of a merge, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Feasibility,
    Boundary,
    Build,
    Normalize,
    Subset,
    Plan,
    Commit,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feasibility => "feasibility",
            Self::Boundary => "boundary",
            Self::Build => "build",
            Self::Normalize => "normalize",
            Self::Subset => "subset",
            Self::Plan => "plan",
            Self::Commit => "commit",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened during a merge.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeEvent {
    StageStarted {
        stage: Stage,
    },
    StageFinished {
        stage: Stage,
        elapsed: Duration,
    },
    SampleOpened {
        path: PathBuf,
        dimensions: String,
    },
    SampleFailed {
        path: PathBuf,
        error: String,
    },
    FeasibilityChecked {
        files: usize,
        estimated_bytes: u64,
        ceiling_bytes: u64,
        feasible: bool,
    },
    BoundaryResolved {
        raw: BoundingBox,
        bounds: BoundingBox,
    },
    DatasetBuilt {
        files: usize,
        time_steps: usize,
        variables: usize,
    },
    CoordinatesNormalized {
        lon: String,
        lat: String,
    },
    SubsetSelected {
        time_steps: usize,
        rows: usize,
        cols: usize,
        duplicates_dropped: usize,
    },
    GapDetected {
        gap: TimeGap,
    },
    EmptySelection {
        reason: String,
    },
    ChunksPlanned {
        tasks: usize,
        reads: usize,
        max_chunk_bytes: usize,
    },
    WaveCompleted {
        completed: usize,
        total: usize,
    },
    Committed {
        path: PathBuf,
        bytes: u64,
        peak_chunk_bytes: usize,
    },
}

/// Receiver of merge events.
pub trait MergeObserver: Send + Sync {
    fn on_event(&self, event: &MergeEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MergeObserver for TracingObserver {
    fn on_event(&self, event: &MergeEvent) {
        match event {
            MergeEvent::StageStarted { stage } => debug!(stage = %stage, "Stage started"),
            MergeEvent::StageFinished { stage, elapsed } => info!(
                stage = %stage,
                elapsed_ms = elapsed.as_millis() as u64,
                "Stage finished"
            ),
            MergeEvent::SampleOpened { path, dimensions } => info!(
                file = %path.display(),
                dimensions = %dimensions,
                "Sample file opened"
            ),
            MergeEvent::SampleFailed { path, error } => warn!(
                file = %path.display(),
                error = %error,
                "Sample file failed to open"
            ),
            MergeEvent::FeasibilityChecked {
                files,
                estimated_bytes,
                ceiling_bytes,
                feasible,
            } => info!(
                files,
                estimated_gb = *estimated_bytes as f64 / (1024.0 * 1024.0 * 1024.0),
                ceiling_gb = *ceiling_bytes as f64 / (1024.0 * 1024.0 * 1024.0),
                feasible,
                "Feasibility checked"
            ),
            MergeEvent::BoundaryResolved { raw, bounds } => info!(
                raw = %raw,
                bounds = %bounds,
                "Boundary resolved"
            ),
            MergeEvent::DatasetBuilt {
                files,
                time_steps,
                variables,
            } => info!(files, time_steps, variables, "Virtual dataset built"),
            MergeEvent::CoordinatesNormalized { lon, lat } => {
                debug!(lon = %lon, lat = %lat, "Horizontal coordinates normalized")
            }
            MergeEvent::SubsetSelected {
                time_steps,
                rows,
                cols,
                duplicates_dropped,
            } => {
                info!(time_steps, rows, cols, "Subset selected");
                if *duplicates_dropped > 0 {
                    warn!(duplicates_dropped, "Dropped duplicate timestamps");
                }
            }
            MergeEvent::GapDetected { gap } => warn!(
                start = %gap.start,
                end = %gap.end,
                missing = gap.missing,
                "Time gap detected"
            ),
            MergeEvent::EmptySelection { reason } => {
                warn!(reason = %reason, "Spatial selection is empty")
            }
            MergeEvent::ChunksPlanned {
                tasks,
                reads,
                max_chunk_bytes,
            } => info!(tasks, reads, max_chunk_bytes, "Chunk graph planned"),
            MergeEvent::WaveCompleted { completed, total } => {
                debug!(completed, total, "Chunk wave written")
            }
            MergeEvent::Committed {
                path,
                bytes,
                peak_chunk_bytes,
            } => info!(
                output = %path.display(),
                bytes,
                peak_chunk_bytes,
                "Output committed"
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<MergeEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<MergeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Stages that finished, in order.
    pub fn finished_stages(&self) -> Vec<Stage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MergeEvent::StageFinished { stage, .. } => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl MergeObserver for RecordingObserver {
    fn on_event(&self, event: &MergeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Emits `StageStarted` now and `StageFinished` when dropped.
pub(crate) struct StageTimer<'a> {
    observer: &'a dyn MergeObserver,
    stage: Stage,
    started: std::time::Instant,
}

impl<'a> StageTimer<'a> {
    pub(crate) fn start(observer: &'a dyn MergeObserver, stage: Stage) -> Self {
        observer.on_event(&MergeEvent::StageStarted { stage });
        Self {
            observer,
            stage,
            started: std::time::Instant::now(),
        }
    }
}

impl Drop for StageTimer<'_> {
    fn drop(&mut self) {
        self.observer.on_event(&MergeEvent::StageFinished {
            stage: self.stage,
            elapsed: self.started.elapsed(),
        });
    }
}
