//! Core types for chunked access.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::config::ChunkPolicy;

/// Position of a chunk in the chunk grid (time, row, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkIndex {
    pub time: usize,
    pub row: usize,
    pub col: usize,
}

impl std::fmt::Display for ChunkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.time, self.row, self.col)
    }
}

/// Half-open index window along (time, row, col).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRegion {
    pub time: Range<usize>,
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl ChunkRegion {
    /// Number of cells in one time step.
    pub fn plane_len(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.time.len() * self.plane_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size in bytes when held as `f32`.
    pub fn byte_size(&self) -> usize {
        self.len() * std::mem::size_of::<f32>()
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.time.len(), self.rows.len(), self.cols.len()]
    }
}

/// Split `0..len` into consecutive ranges of at most `step` elements.
pub fn split_extent(len: usize, step: usize) -> Vec<Range<usize>> {
    if step == 0 {
        return Vec::new();
    }
    (0..len)
        .step_by(step)
        .map(|start| start..(start + step).min(len))
        .collect()
}

/// Regular chunk layout over a (time, row, col) array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGrid {
    pub shape: [usize; 3],
    pub policy: ChunkPolicy,
}

impl ChunkGrid {
    pub fn new(shape: [usize; 3], policy: ChunkPolicy) -> Self {
        Self { shape, policy }
    }

    /// Number of chunks along each axis.
    pub fn counts(&self) -> [usize; 3] {
        [
            self.shape[0].div_ceil(self.policy.time.max(1)),
            self.shape[1].div_ceil(self.policy.rows.max(1)),
            self.shape[2].div_ceil(self.policy.cols.max(1)),
        ]
    }

    /// Total number of chunks.
    pub fn len(&self) -> usize {
        self.counts().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every chunk in C order (time slowest).
    pub fn regions(&self) -> Vec<(ChunkIndex, ChunkRegion)> {
        let times = split_extent(self.shape[0], self.policy.time);
        let rows = split_extent(self.shape[1], self.policy.rows);
        let cols = split_extent(self.shape[2], self.policy.cols);

        let mut out = Vec::with_capacity(times.len() * rows.len() * cols.len());
        for (ti, t) in times.iter().enumerate() {
            for (ri, r) in rows.iter().enumerate() {
                for (ci, c) in cols.iter().enumerate() {
                    out.push((
                        ChunkIndex {
                            time: ti,
                            row: ri,
                            col: ci,
                        },
                        ChunkRegion {
                            time: t.clone(),
                            rows: r.clone(),
                            cols: c.clone(),
                        },
                    ));
                }
            }
        }
        out
    }
}
