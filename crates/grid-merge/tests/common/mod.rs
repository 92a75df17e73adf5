//! Common test utilities for grid-merge tests
//!
//! Provides:
//! - A synthetic [`RasterSource`] that fabricates files without touching disk
//! - A [`ChunkSink`] that records what the scheduler writes
//! - Fixture series and boundaries on disk for end-to-end runs

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use grid_merge::{ChunkRegion, ChunkSink, RasterSource, SlabRequest};
use netcdf_parser::{DimensionInfo, NetCdfError, NetCdfResult, Packing, RasterFile, VariableInfo};
use sst_common::CfTimeUnits;
use test_utils::{regular_axis, FIXTURE_TIME_UNITS, SECONDS_PER_DAY};

const GIB: u64 = 1024 * 1024 * 1024;

/// Fabricated single-day files named `synthetic/dayNNNNN.nc`.
///
/// Every cell of day `d` reads as `d as f32`.
pub struct SyntheticSource {
    pub rows: usize,
    pub cols: usize,
    pub file_bytes: u64,
    pub probes: AtomicUsize,
    pub slab_reads: AtomicUsize,
}

impl SyntheticSource {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            file_bytes: 1024,
            probes: AtomicUsize::new(0),
            slab_reads: AtomicUsize::new(0),
        }
    }

    pub fn with_file_gib(mut self, gib: u64) -> Self {
        self.file_bytes = gib * GIB;
        self
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn slab_reads(&self) -> usize {
        self.slab_reads.load(Ordering::SeqCst)
    }
}

/// Paths understood by [`SyntheticSource`], one per day.
pub fn synthetic_paths(days: impl IntoIterator<Item = i64>) -> Vec<PathBuf> {
    days.into_iter()
        .map(|d| PathBuf::from(format!("synthetic/day{:05}.nc", d)))
        .collect()
}

fn day_of(path: &Path) -> NetCdfResult<i64> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix("day"))
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| NetCdfError::MissingData {
            path: path.to_path_buf(),
            what: "synthetic day number".to_string(),
        })
}

fn coordinate(name: &str) -> VariableInfo {
    VariableInfo {
        name: name.to_string(),
        dimensions: vec![name.to_string()],
        dtype: "Float(F64)".to_string(),
        packing: Packing::default(),
        attributes: BTreeMap::new(),
    }
}

impl RasterSource for SyntheticSource {
    fn file_size(&self, _path: &Path) -> NetCdfResult<u64> {
        Ok(self.file_bytes)
    }

    fn probe(&self, path: &Path, time_dimension: &str) -> NetCdfResult<RasterFile> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let day = day_of(path)?;
        let time_units = CfTimeUnits::parse(FIXTURE_TIME_UNITS).map_err(|source| {
            NetCdfError::Time {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let time = time_units
            .decode((day * SECONDS_PER_DAY + 12 * 3600) as f64)
            .map_err(|source| NetCdfError::Time {
                path: path.to_path_buf(),
                source,
            })?;

        let dims = [("time", 1), ("lat", self.rows), ("lon", self.cols)];
        Ok(RasterFile {
            path: path.to_path_buf(),
            byte_size: self.file_bytes,
            dimensions: dims
                .iter()
                .map(|&(name, len)| DimensionInfo {
                    name: name.to_string(),
                    len,
                })
                .collect(),
            variables: vec![
                coordinate(time_dimension),
                coordinate("lat"),
                coordinate("lon"),
                VariableInfo {
                    name: "analysed_sst".to_string(),
                    dimensions: vec![time_dimension.into(), "lat".into(), "lon".into()],
                    dtype: "Float(F32)".to_string(),
                    packing: Packing::default(),
                    attributes: BTreeMap::new(),
                },
            ],
            time_dimension: time_dimension.to_string(),
            times: vec![time],
            time_units,
        })
    }

    fn read_coordinate(&self, _path: &Path, name: &str) -> NetCdfResult<Vec<f64>> {
        Ok(match name {
            "lat" => regular_axis(-10.0, 0.25, self.rows),
            _ => regular_axis(-20.0, 0.25, self.cols),
        })
    }

    fn read_slab_into(&self, request: &SlabRequest<'_>, out: &mut [f32]) -> NetCdfResult<()> {
        self.slab_reads.fetch_add(1, Ordering::SeqCst);
        let day = day_of(request.path)?;
        out.fill(day as f32);
        Ok(())
    }
}

/// Records chunk writes instead of storing them.
#[derive(Debug, Default)]
pub struct CountingSink {
    pub chunks: usize,
    pub values: usize,
    pub regions: HashSet<(String, usize, usize, usize)>,
    /// First value of each time plane, keyed by absolute time index.
    pub plane_values: BTreeMap<usize, f32>,
}

impl ChunkSink for CountingSink {
    fn write_chunk(
        &mut self,
        variable: &str,
        region: &ChunkRegion,
        data: &[f32],
    ) -> grid_merge::Result<()> {
        assert_eq!(data.len(), region.len());
        let fresh = self.regions.insert((
            variable.to_string(),
            region.time.start,
            region.rows.start,
            region.cols.start,
        ));
        assert!(fresh, "chunk written twice: {:?}", region);

        let plane = region.plane_len();
        for (k, t) in region.time.clone().enumerate() {
            self.plane_values.insert(t, data[k * plane]);
        }
        self.chunks += 1;
        self.values += data.len();
        Ok(())
    }
}

/// Writes a GeoJSON boundary with a single box.
pub fn boundary_file(dir: &Path, b: (f64, f64, f64, f64)) -> PathBuf {
    test_utils::write_geojson_boundary(&dir.join("boundary.geojson"), &[b]).unwrap()
}

/// Files in `dir` whose name ends with `.partial`.
pub fn partial_files(dir: &Path) -> Vec<PathBuf> {
    test_utils::list_files(dir)
        .into_iter()
        .filter(|p| p.to_string_lossy().ends_with(".partial"))
        .collect()
}
