//! File-level metadata extracted without touching bulk data.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sst_common::CfTimeUnits;

/// A named dimension and its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub name: String,
    pub len: usize,
}

/// CF packing and missing-value convention for one variable.
///
/// Values are stored as `raw * scale_factor + add_offset`; raw values equal
/// to the fill or missing value decode to NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            add_offset: 0.0,
            fill_value: None,
            missing_value: None,
        }
    }
}

impl Packing {
    /// Whether a raw value marks a missing cell.
    pub fn is_missing(&self, raw: f32) -> bool {
        if raw.is_nan() {
            return true;
        }
        // Cells are read as f32, so sentinels are matched at f32 precision.
        let matches = |sentinel: Option<f64>| sentinel.map(|v| v as f32) == Some(raw);
        matches(self.fill_value) || matches(self.missing_value)
    }

    /// Decode raw values in place, replacing missing cells with NaN.
    pub fn unpack_in_place(&self, data: &mut [f32]) {
        let identity = self.scale_factor == 1.0 && self.add_offset == 0.0;
        for value in data.iter_mut() {
            if self.is_missing(*value) {
                *value = f32::NAN;
            } else if !identity {
                *value = (*value as f64 * self.scale_factor + self.add_offset) as f32;
            }
        }
    }
}

/// Metadata for one variable in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    /// Dimension names in storage order.
    pub dimensions: Vec<String>,
    /// Storage type as reported by the library (e.g. `Int(I16)`).
    pub dtype: String,
    pub packing: Packing,
    /// String-valued attributes (units, long_name, ...).
    pub attributes: BTreeMap<String, String>,
}

impl VariableInfo {
    /// A coordinate variable is 1-D and named after its dimension.
    pub fn is_coordinate(&self) -> bool {
        self.dimensions.len() == 1 && self.dimensions[0] == self.name
    }
}

/// One input raster file, described by its metadata only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterFile {
    pub path: PathBuf,
    pub byte_size: u64,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
    pub time_dimension: String,
    /// Decoded time coordinate, in file order.
    pub times: Vec<DateTime<Utc>>,
    pub time_units: CfTimeUnits,
}

impl RasterFile {
    /// File name component of the path, for diagnostics.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn dimension_len(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().find(|d| d.name == name).map(|d| d.len)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Names of all non-coordinate variables.
    pub fn data_variable_names(&self) -> BTreeSet<&str> {
        self.variables
            .iter()
            .filter(|v| !v.is_coordinate())
            .map(|v| v.name.as_str())
            .collect()
    }

    /// Whether a coordinate variable with this name exists.
    pub fn has_coordinate(&self, name: &str) -> bool {
        self.variables
            .iter()
            .any(|v| v.name == name && v.is_coordinate())
    }

    /// Dimensions other than time, in file order.
    pub fn spatial_dimensions(&self) -> Vec<&DimensionInfo> {
        self.dimensions
            .iter()
            .filter(|d| d.name != self.time_dimension)
            .collect()
    }
}
