//! Lazy chunk graph and its wave scheduler.
//!
//! A [`TaskGraph`] has one [`ChunkTask`] per (variable, chunk). Each task
//! lists the slab reads it depends on: one per (file, time step) covered by
//! the chunk. The [`Scheduler`] evaluates tasks in waves of at most
//! `workers`: reads run in parallel on the rayon pool, then the wave is
//! written sequentially through the sink. Nothing outlives its wave.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::config::ChunkPolicy;
use crate::dataset::TimeSlice;
use crate::error::{MergeError, Result};
use crate::events::{MergeEvent, MergeObserver};
use crate::pool::{BufferPool, PoolStats, PooledBuffer};
use crate::source::{RasterSource, SlabRequest};
use crate::subset::SubsetDataset;
use crate::types::{ChunkGrid, ChunkIndex, ChunkRegion};
use crate::writer::ChunkSink;

/// Identity of a chunk task: which variable, which chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    /// Index into the subset's variable list.
    pub variable: usize,
    pub chunk: ChunkIndex,
}

/// One slab read feeding a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadNode {
    pub slice: TimeSlice,
    /// Time offset of the slab inside the chunk.
    pub target: usize,
}

/// Evaluation of one (variable, chunk).
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkTask {
    pub key: TaskKey,
    /// Region in output (subset) index space.
    pub region: ChunkRegion,
    pub reads: Vec<ReadNode>,
}

/// Every chunk task of a merge, in evaluation order.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    pub grid: ChunkGrid,
    pub tasks: Vec<ChunkTask>,
}

impl TaskGraph {
    /// Plan tasks for every variable of `subset`, variable by variable.
    pub fn plan(subset: &SubsetDataset, policy: ChunkPolicy) -> Self {
        let grid = ChunkGrid::new(subset.shape(), policy);
        let regions = grid.regions();

        let mut tasks = Vec::with_capacity(regions.len() * subset.source.variables.len());
        for variable in 0..subset.source.variables.len() {
            for (chunk, region) in &regions {
                let reads = region
                    .time
                    .clone()
                    .enumerate()
                    .map(|(target, t)| ReadNode {
                        slice: subset.slices[t],
                        target,
                    })
                    .collect();
                tasks.push(ChunkTask {
                    key: TaskKey {
                        variable,
                        chunk: *chunk,
                    },
                    region: region.clone(),
                    reads,
                });
            }
        }

        Self { grid, tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Total slab reads across all tasks.
    pub fn read_count(&self) -> usize {
        self.tasks.iter().map(|t| t.reads.len()).sum()
    }

    /// Bytes of the largest chunk.
    pub fn max_chunk_bytes(&self) -> usize {
        self.tasks
            .iter()
            .map(|t| t.region.byte_size())
            .max()
            .unwrap_or(0)
    }
}

/// Cooperative cancellation flag shared between threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub chunks_written: usize,
    pub waves: usize,
    pub pool: PoolStats,
}

/// Evaluates a [`TaskGraph`] in bounded waves.
pub struct Scheduler<'a> {
    source: &'a dyn RasterSource,
    workers: usize,
    cancel: &'a CancelToken,
    observer: &'a dyn MergeObserver,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        source: &'a dyn RasterSource,
        workers: usize,
        cancel: &'a CancelToken,
        observer: &'a dyn MergeObserver,
    ) -> Self {
        Self {
            source,
            workers: workers.max(1),
            cancel,
            observer,
        }
    }

    /// Evaluate every task once and hand each chunk to `sink`.
    ///
    /// The cancel token is checked before each wave.
    pub fn run(
        &self,
        graph: &TaskGraph,
        subset: &SubsetDataset,
        sink: &mut dyn ChunkSink,
    ) -> Result<ScheduleStats> {
        let pool = BufferPool::new(self.workers);
        let total = graph.len();
        let mut stats = ScheduleStats::default();

        for wave in graph.tasks.chunks(self.workers) {
            if self.cancel.is_cancelled() {
                debug!(completed = stats.chunks_written, total, "Cancellation observed");
                return Err(MergeError::Cancelled);
            }

            let buffers: Vec<PooledBuffer<'_>> = wave
                .par_iter()
                .map(|task| self.evaluate(task, subset, &pool))
                .collect::<Result<_>>()?;

            for (task, buffer) in wave.iter().zip(&buffers) {
                let name = &subset.source.variables[task.key.variable].name;
                sink.write_chunk(name, &task.region, buffer)?;
            }
            drop(buffers);

            stats.chunks_written += wave.len();
            stats.waves += 1;
            self.observer.on_event(&MergeEvent::WaveCompleted {
                completed: stats.chunks_written,
                total,
            });
        }

        stats.pool = pool.stats();
        Ok(stats)
    }

    fn evaluate<'p>(
        &self,
        task: &ChunkTask,
        subset: &SubsetDataset,
        pool: &'p BufferPool,
    ) -> Result<PooledBuffer<'p>> {
        let variable = &subset.source.variables[task.key.variable];
        let dataset = &subset.source.dataset;
        let plane = task.region.plane_len();
        let rows = offset(&task.region.rows, subset.lat_range.start);
        let cols = offset(&task.region.cols, subset.lon_range.start);

        let mut buffer = pool.acquire(task.region.len())?;
        for read in &task.reads {
            let file = &dataset.files[read.slice.file];
            let packing = file
                .variable(&variable.name)
                .map(|v| &v.packing)
                .unwrap_or(&variable.packing);
            let request = SlabRequest {
                path: &file.path,
                variable: &variable.name,
                time_index: read.slice.local_index,
                rows: rows.clone(),
                cols: cols.clone(),
                packing,
            };
            let out = &mut buffer[read.target * plane..(read.target + 1) * plane];
            self.source.read_slab_into(&request, out)?;
        }
        Ok(buffer)
    }
}

fn offset(range: &Range<usize>, by: usize) -> Range<usize> {
    range.start + by..range.end + by
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_offset_shifts_into_source_space() {
        assert_eq!(offset(&(0..4), 10), 10..14);
        assert_eq!(offset(&(3..3), 2), 5..5);
    }
}
