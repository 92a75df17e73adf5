//! Native NetCDF access using the netcdf library.
//!
//! Files are opened per operation and closed when the handle drops, so no
//! handle outlives the call that needed it. Metadata probing never reads
//! data variables; slab reads fetch exactly one time step of one variable
//! over a row/column window.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Once;

use tracing::debug;

use sst_common::CfTimeUnits;

use crate::error::{NetCdfError, NetCdfResult};
use crate::schema::{DimensionInfo, Packing, RasterFile, VariableInfo};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose diagnostics to stderr even when the
/// error is handled on the Rust side (e.g. probing for an optional
/// attribute). This disables that output once per process.
///
/// Call this before any HDF5/NetCDF operation; every entry point in this
/// crate does so.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Open a file read-only.
pub(crate) fn open(path: &Path) -> NetCdfResult<netcdf::File> {
    silence_hdf5_errors();
    netcdf::open(path).map_err(|source| NetCdfError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a file's dimensions, variables and decoded time axis.
///
/// Only the time coordinate is read; data variables are described from
/// their headers.
pub fn probe_file(path: &Path, time_dimension: &str) -> NetCdfResult<RasterFile> {
    let byte_size = std::fs::metadata(path)
        .map_err(|source| NetCdfError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    let file = open(path)?;

    let dimensions: Vec<DimensionInfo> = file
        .dimensions()
        .map(|d| DimensionInfo {
            name: d.name().to_string(),
            len: d.len(),
        })
        .collect();

    if !dimensions.iter().any(|d| d.name == time_dimension) {
        return Err(NetCdfError::missing(
            path,
            format!("time dimension '{}'", time_dimension),
        ));
    }

    let variables: Vec<VariableInfo> = file.variables().map(|v| describe_variable(&v)).collect();

    let time_var = file.variable(time_dimension).ok_or_else(|| {
        NetCdfError::missing(path, format!("time coordinate variable '{}'", time_dimension))
    })?;
    let units = get_string_attr(&time_var, "units").ok_or_else(|| {
        NetCdfError::missing(path, format!("'units' attribute on '{}'", time_dimension))
    })?;
    let time_units = CfTimeUnits::parse(&units).map_err(|source| NetCdfError::Time {
        path: path.to_path_buf(),
        source,
    })?;

    let raw_times: Vec<f64> = time_var.get_values(..).map_err(|source| NetCdfError::Read {
        path: path.to_path_buf(),
        variable: time_dimension.to_string(),
        source,
    })?;
    let times = raw_times
        .iter()
        .map(|&v| time_units.decode(v))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| NetCdfError::Time {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        path = %path.display(),
        bytes = byte_size,
        variables = variables.len(),
        time_steps = times.len(),
        "Probed NetCDF file"
    );

    Ok(RasterFile {
        path: path.to_path_buf(),
        byte_size,
        dimensions,
        variables,
        time_dimension: time_dimension.to_string(),
        times,
        time_units,
    })
}

/// Read a 1-D coordinate variable as f64.
pub fn read_coordinate(path: &Path, name: &str) -> NetCdfResult<Vec<f64>> {
    let file = open(path)?;
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::missing(path, format!("coordinate variable '{}'", name)))?;
    if var.dimensions().len() != 1 {
        return Err(NetCdfError::invalid(
            path,
            format!("coordinate '{}' is not one-dimensional", name),
        ));
    }
    var.get_values(..).map_err(|source| NetCdfError::Read {
        path: path.to_path_buf(),
        variable: name.to_string(),
        source,
    })
}

/// Read one time step of a (time, row, col) variable over a window.
///
/// Values come back row-major, decoded with `packing`.
pub fn read_slab(
    path: &Path,
    variable: &str,
    time_index: usize,
    rows: Range<usize>,
    cols: Range<usize>,
    packing: &Packing,
) -> NetCdfResult<Vec<f32>> {
    let mut data = vec![0.0f32; rows.len() * cols.len()];
    read_slab_into(path, variable, time_index, rows, cols, packing, &mut data)?;
    Ok(data)
}

/// Like [`read_slab`], but fills a caller-provided buffer.
///
/// `out` must hold exactly `rows.len() * cols.len()` values.
pub fn read_slab_into(
    path: &Path,
    variable: &str,
    time_index: usize,
    rows: Range<usize>,
    cols: Range<usize>,
    packing: &Packing,
    out: &mut [f32],
) -> NetCdfResult<()> {
    let expected = rows.len() * cols.len();
    if out.len() != expected {
        return Err(NetCdfError::invalid(
            path,
            format!(
                "slab buffer for '{}' holds {} values, expected {}",
                variable,
                out.len(),
                expected
            ),
        ));
    }

    let file = open(path)?;
    let var = file
        .variable(variable)
        .ok_or_else(|| NetCdfError::missing(path, format!("variable '{}'", variable)))?;
    if var.dimensions().len() != 3 {
        return Err(NetCdfError::invalid(
            path,
            format!(
                "variable '{}' has {} dimensions, expected 3",
                variable,
                var.dimensions().len()
            ),
        ));
    }

    var.get_values_into(out, (time_index, rows, cols))
        .map_err(|source| NetCdfError::Read {
            path: path.to_path_buf(),
            variable: variable.to_string(),
            source,
        })?;

    packing.unpack_in_place(out);
    Ok(())
}

// =============================================================================
// Internal helpers
// =============================================================================

pub(crate) fn describe_variable(var: &netcdf::Variable) -> VariableInfo {
    let mut attributes = BTreeMap::new();
    for attr in var.attributes() {
        if let Ok(netcdf::AttributeValue::Str(s)) = attr.value() {
            attributes.insert(attr.name().to_string(), s);
        }
    }

    VariableInfo {
        name: var.name().to_string(),
        dimensions: var.dimensions().iter().map(|d| d.name().to_string()).collect(),
        dtype: format!("{:?}", var.vartype()),
        packing: Packing {
            scale_factor: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
            add_offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
        },
        attributes,
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute as f64.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get a string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
