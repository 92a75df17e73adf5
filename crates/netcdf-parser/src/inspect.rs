//! Single-file summaries: dimensions plus per-variable missing counts.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{describe_variable, open};
use crate::schema::DimensionInfo;

/// Summary of one variable.
#[derive(Debug, Clone, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: String,
    /// Cells equal to the fill/missing value or NaN.
    pub missing: u64,
    pub total: u64,
}

/// Summary of one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableSummary>,
}

/// Summarize every non-coordinate variable in a file.
///
/// Missing values are counted one slab along the leading dimension at a
/// time, so memory stays bounded by a single slab.
pub fn summarize_file(path: &Path) -> NetCdfResult<FileSummary> {
    let file = open(path)?;

    let dimensions = file
        .dimensions()
        .map(|d| DimensionInfo {
            name: d.name().to_string(),
            len: d.len(),
        })
        .collect();

    let mut variables = Vec::new();
    for var in file.variables() {
        let info = describe_variable(&var);
        if info.is_coordinate() {
            continue;
        }

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let total: u64 = shape.iter().map(|&n| n as u64).product();
        let read_err = |source| NetCdfError::Read {
            path: path.to_path_buf(),
            variable: info.name.clone(),
            source,
        };

        let mut missing = 0u64;
        let mut count = |values: Vec<f32>| {
            missing += values.iter().filter(|&&v| info.packing.is_missing(v)).count() as u64;
        };

        let leading = shape.first().copied().unwrap_or(1);
        match shape.len() {
            2 => {
                for i in 0..leading {
                    count(var.get_values::<f32, _>((i, ..)).map_err(read_err)?);
                }
            }
            3 => {
                for i in 0..leading {
                    count(var.get_values::<f32, _>((i, .., ..)).map_err(read_err)?);
                }
            }
            4 => {
                for i in 0..leading {
                    count(var.get_values::<f32, _>((i, .., .., ..)).map_err(read_err)?);
                }
            }
            _ => count(var.get_values::<f32, _>(..).map_err(read_err)?),
        }

        variables.push(VariableSummary {
            name: info.name.clone(),
            shape,
            dtype: info.dtype.clone(),
            missing,
            total,
        });
    }

    Ok(FileSummary {
        path: path.to_path_buf(),
        dimensions,
        variables,
    })
}
