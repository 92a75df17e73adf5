//! Chunked merge-and-subset engine for daily gridded SST files.
//!
//! Many same-schema NetCDF files (one per day, global grid) are presented as
//! one lazily evaluated dataset, restricted to a buffered region of interest,
//! sorted by time, and written to a single compressed NetCDF-4 file. The
//! full dataset is never held in memory: data moves one chunk at a time.
//!
//! # Architecture
//!
//! ```text
//! MergePipeline::run(request)
//!      │
//!      ├─► resolve_boundary ──┐  (concurrently)
//!      ├─► FeasibilityGate ───┘
//!      │
//!      ├─► VirtualDatasetBuilder  probe metadata, validate schema
//!      ├─► normalize              {longitude, latitude} | {lon, lat}
//!      ├─► subset                 inclusive box, sort + dedup time, gaps
//!      │
//!      ├─► TaskGraph::plan        one task per (variable, chunk)
//!      └─► Scheduler::run         waves of reads → NetCdfWriter
//!               │
//!               ▼
//!          .partial file renamed into place
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_merge::{MergeConfig, MergeOutcome, MergePipeline, MergeRequest};
//!
//! let pipeline = MergePipeline::new(MergeConfig::from_env());
//! let outcome = pipeline.run(&MergeRequest {
//!     input_files,
//!     boundary: "aoi.geojson".into(),
//!     output: "merged.nc4".into(),
//!     buffer_degrees: 0.1,
//! })?;
//! if let MergeOutcome::Committed(report) = outcome {
//!     println!("{} time steps", report.time_steps);
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod encode;
pub mod error;
pub mod events;
pub mod feasibility;
pub mod graph;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod source;
pub mod subset;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use boundary::RegionOfInterest;
pub use config::{
    ChunkPolicy, DiscoveryConfig, FeasibilityConfig, MergeConfig, OutputEncoding,
    ProvenanceConfig,
};
pub use dataset::{TimeSlice, VirtualDataset, VirtualDatasetBuilder};
pub use encode::{output_chunk_shape, EncodingPlan, Provenance, VariableEncoding};
pub use error::{MergeError, Result};
pub use events::{MergeEvent, MergeObserver, RecordingObserver, Stage, TracingObserver};
pub use feasibility::{FeasibilityGate, FeasibilityReport, SampleOutcome, SampleReport};
pub use graph::{CancelToken, ChunkTask, ScheduleStats, Scheduler, TaskGraph, TaskKey};
pub use normalize::{normalize, NormalizedDataset, COORDINATE_ALIASES};
pub use pipeline::{MergeOutcome, MergePipeline, MergeReport, MergeRequest};
pub use pool::{BufferPool, PoolStats};
pub use source::{NetCdfSource, RasterSource, SlabRequest};
pub use subset::{select_range, subset, EmptySelection, Selection, SubsetDataset};
pub use types::{ChunkGrid, ChunkIndex, ChunkRegion};
pub use writer::{ChunkSink, NetCdfWriter};
