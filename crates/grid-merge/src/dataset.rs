//! Virtual concatenation of many same-schema files along time.
//!
//! Building a [`VirtualDataset`] probes every file's metadata (in parallel)
//! and validates the schema, but reads no data variable. Payloads are read
//! later, one slab at a time, by the chunk scheduler.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use netcdf_parser::{DimensionInfo, RasterFile, VariableInfo};
use rayon::prelude::*;
use sst_common::CfTimeUnits;
use tracing::debug;

use crate::config::{ChunkPolicy, MergeConfig};
use crate::error::{MergeError, Result};
use crate::events::{MergeEvent, MergeObserver, Stage, StageTimer};
use crate::source::RasterSource;

/// One time step of the virtual dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlice {
    /// Index into [`VirtualDataset::files`].
    pub file: usize,
    /// Index along that file's own time dimension.
    pub local_index: usize,
    pub time: DateTime<Utc>,
}

/// Many files presented as one logical dataset.
///
/// Slices are in file order, not yet time order.
#[derive(Debug, Clone)]
pub struct VirtualDataset {
    pub files: Vec<RasterFile>,
    pub time_dimension: String,
    /// Time units of the first file; used for the output axis.
    pub time_units: CfTimeUnits,
    /// Non-time dimensions shared by every file, in file order.
    pub spatial_dimensions: Vec<DimensionInfo>,
    /// 1-D coordinate values read from the first file, keyed by dimension.
    pub spatial_coordinates: BTreeMap<String, Vec<f64>>,
    /// Non-coordinate variables, as described by the first file.
    pub variables: Vec<VariableInfo>,
    pub slices: Vec<TimeSlice>,
    pub chunk_policy: ChunkPolicy,
}

impl VirtualDataset {
    pub fn time_len(&self) -> usize {
        self.slices.len()
    }

    /// Path of the file holding a slice.
    pub fn slice_path(&self, slice: &TimeSlice) -> &std::path::Path {
        &self.files[slice.file].path
    }

    /// Length of a spatial dimension.
    pub fn dimension_len(&self, name: &str) -> Option<usize> {
        self.spatial_dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.len)
    }

    /// Names of spatial coordinate variables, sorted.
    pub fn coordinate_names(&self) -> Vec<&str> {
        self.spatial_coordinates.keys().map(String::as_str).collect()
    }
}

/// Builds a [`VirtualDataset`] from an ordered file list.
pub struct VirtualDatasetBuilder<'a> {
    source: &'a dyn RasterSource,
    config: &'a MergeConfig,
    observer: &'a dyn MergeObserver,
}

impl<'a> VirtualDatasetBuilder<'a> {
    pub fn new(
        source: &'a dyn RasterSource,
        config: &'a MergeConfig,
        observer: &'a dyn MergeObserver,
    ) -> Self {
        Self {
            source,
            config,
            observer,
        }
    }

    /// Probe, validate and index `paths` (in the given order).
    pub fn build(&self, paths: &[PathBuf]) -> Result<VirtualDataset> {
        let _timer = StageTimer::start(self.observer, Stage::Build);

        if paths.is_empty() {
            return Err(MergeError::Infeasible {
                reason: "no input files".to_string(),
            });
        }
        self.check_chunk_budget()?;

        let time_dim = self.config.time_dimension.as_str();
        let files: Vec<RasterFile> = paths
            .par_iter()
            .map(|p| self.source.probe(p, time_dim))
            .collect::<std::result::Result<_, _>>()?;

        let first = &files[0];
        for other in &files[1..] {
            validate_schema(first, other)?;
        }

        let spatial_dimensions: Vec<DimensionInfo> =
            first.spatial_dimensions().into_iter().cloned().collect();

        let mut spatial_coordinates = BTreeMap::new();
        for dim in &spatial_dimensions {
            if first.has_coordinate(&dim.name) {
                let values = self.source.read_coordinate(&first.path, &dim.name)?;
                if values.len() != dim.len {
                    return Err(MergeError::schema(
                        &first.path,
                        format!(
                            "coordinate '{}' has {} values but dimension length {}",
                            dim.name,
                            values.len(),
                            dim.len
                        ),
                    ));
                }
                spatial_coordinates.insert(dim.name.clone(), values);
            }
        }

        let variables: Vec<VariableInfo> = first
            .variables
            .iter()
            .filter(|v| !v.is_coordinate())
            .cloned()
            .collect();

        let slices: Vec<TimeSlice> = files
            .iter()
            .enumerate()
            .flat_map(|(file, f)| {
                f.times.iter().enumerate().map(move |(local_index, &time)| TimeSlice {
                    file,
                    local_index,
                    time,
                })
            })
            .collect();

        debug!(
            files = files.len(),
            time_steps = slices.len(),
            coordinates = ?spatial_coordinates.keys().collect::<Vec<_>>(),
            "Indexed virtual dataset"
        );
        self.observer.on_event(&MergeEvent::DatasetBuilt {
            files: files.len(),
            time_steps: slices.len(),
            variables: variables.len(),
        });

        Ok(VirtualDataset {
            time_dimension: time_dim.to_string(),
            time_units: first.time_units,
            spatial_dimensions,
            spatial_coordinates,
            variables,
            slices,
            chunk_policy: self.config.chunk_policy,
            files,
        })
    }

    fn check_chunk_budget(&self) -> Result<()> {
        let policy = self.config.chunk_policy;
        policy.validate().map_err(MergeError::Config)?;
        let bytes = policy.chunk_bytes();
        if bytes > self.config.max_chunk_bytes {
            return Err(MergeError::resource(format!(
                "chunk policy {} needs {} bytes per chunk, budget is {} bytes",
                policy, bytes, self.config.max_chunk_bytes
            )));
        }
        Ok(())
    }
}

/// Check that `other` has the same spatial shape, dimension names and
/// variable set as `first`.
fn validate_schema(first: &RasterFile, other: &RasterFile) -> Result<()> {
    let dims = |f: &RasterFile| -> Vec<(String, usize)> {
        f.spatial_dimensions()
            .into_iter()
            .map(|d| (d.name.clone(), d.len))
            .collect()
    };
    let (expected, found) = (dims(first), dims(other));
    if expected != found {
        return Err(MergeError::schema(
            &other.path,
            format!(
                "spatial dimensions {:?} differ from {:?} in {}",
                found,
                expected,
                first.file_name()
            ),
        ));
    }

    let expected_vars = first.data_variable_names();
    let found_vars = other.data_variable_names();
    if expected_vars != found_vars {
        let missing: Vec<&str> = expected_vars.difference(&found_vars).copied().collect();
        let extra: Vec<&str> = found_vars.difference(&expected_vars).copied().collect();
        return Err(MergeError::schema(
            &other.path,
            format!(
                "variable set differs from {}: missing {:?}, unexpected {:?}",
                first.file_name(),
                missing,
                extra
            ),
        ));
    }

    for name in expected_vars {
        let (Some(a), Some(b)) = (first.variable(name), other.variable(name)) else {
            continue;
        };
        if a.dimensions != b.dimensions {
            return Err(MergeError::schema(
                &other.path,
                format!(
                    "variable '{}' has dimensions {:?}, expected {:?}",
                    name, b.dimensions, a.dimensions
                ),
            ));
        }
    }

    Ok(())
}
