//! NetCDF-4 writer with atomic commit.
//!
//! The output is built in a hidden `.partial` file next to the target and
//! renamed into place by [`NetCdfWriter::finish`]. Dropping the writer
//! without finishing (error, cancellation) deletes the partial file.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, info};

use crate::encode::EncodingPlan;
use crate::error::{MergeError, Result};
use crate::normalize::{LAT, LON};
use crate::subset::SubsetDataset;
use crate::types::ChunkRegion;
use crate::writer::ChunkSink;

/// Writes a subset as one compressed, chunked NetCDF-4 file.
pub struct NetCdfWriter {
    // Declared before `temp` so the handle closes before the file is removed.
    file: netcdf::FileMut,
    temp: TempPath,
    target: PathBuf,
    chunks_written: usize,
}

impl NetCdfWriter {
    /// Create the partial file and define dimensions, coordinates, data
    /// variables and global attributes.
    pub fn create(target: &Path, subset: &SubsetDataset, plan: &EncodingPlan) -> Result<Self> {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());

        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(".partial")
            .tempfile_in(dir)
            .map_err(|source| MergeError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .into_temp_path();

        let mut file = netcdf::create(&temp).map_err(|e| MergeError::write(target, e))?;
        define(&mut file, subset, plan).map_err(|e| MergeError::write(target, e))?;

        debug!(
            target = %target.display(),
            partial = %temp.display(),
            variables = plan.variables.len(),
            "Created partial output"
        );

        Ok(Self {
            file,
            temp,
            target: target.to_path_buf(),
            chunks_written: 0,
        })
    }

    /// Path of the partial file while writing.
    pub fn partial_path(&self) -> &Path {
        &self.temp
    }

    /// Close the file and move it into place. Returns the final size.
    pub fn finish(self) -> Result<u64> {
        let Self {
            file,
            temp,
            target,
            chunks_written,
        } = self;
        drop(file);

        temp.persist(&target).map_err(|e| MergeError::Io {
            path: target.clone(),
            source: e.error,
        })?;

        let bytes = std::fs::metadata(&target)
            .map_err(|source| MergeError::Io {
                path: target.clone(),
                source,
            })?
            .len();

        info!(
            output = %target.display(),
            bytes,
            chunks = chunks_written,
            "Output file written"
        );
        Ok(bytes)
    }
}

impl ChunkSink for NetCdfWriter {
    fn write_chunk(&mut self, variable: &str, region: &ChunkRegion, data: &[f32]) -> Result<()> {
        if data.len() != region.len() {
            return Err(MergeError::write(
                &self.target,
                format!(
                    "chunk of '{}' has {} values, region needs {}",
                    variable,
                    data.len(),
                    region.len()
                ),
            ));
        }

        let mut var = self.file.variable_mut(variable).ok_or_else(|| {
            MergeError::write(&self.target, format!("variable '{}' not defined", variable))
        })?;
        var.put_values(
            data,
            (region.time.clone(), region.rows.clone(), region.cols.clone()),
        )
        .map_err(|e| MergeError::write(&self.target, e))?;

        self.chunks_written += 1;
        Ok(())
    }
}

fn define(
    file: &mut netcdf::FileMut,
    subset: &SubsetDataset,
    plan: &EncodingPlan,
) -> std::result::Result<(), netcdf::Error> {
    let [nt, nlat, nlon] = subset.shape();
    file.add_dimension("time", nt)?;
    file.add_dimension(LAT, nlat)?;
    file.add_dimension(LON, nlon)?;

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("standard_name", "time")?;
        time_var.put_attribute("axis", "T")?;
        time_var.put_attribute("units", plan.time_units.to_units_string().as_str())?;
        time_var.put_attribute("calendar", "gregorian")?;
    }

    {
        let mut lat_var = file.add_variable::<f64>(LAT, &[LAT])?;
        lat_var.put_attribute("standard_name", "latitude")?;
        lat_var.put_attribute("units", "degrees_north")?;
    }

    {
        let mut lon_var = file.add_variable::<f64>(LON, &[LON])?;
        lon_var.put_attribute("standard_name", "longitude")?;
        lon_var.put_attribute("units", "degrees_east")?;
    }

    for encoding in &plan.variables {
        let mut var = file.add_variable::<f32>(&encoding.name, &["time", LAT, LON])?;
        var.set_chunking(&encoding.chunk_shape)?;
        if encoding.compression_level > 0 {
            var.set_compression(encoding.compression_level, encoding.shuffle)?;
        }
        var.put_attribute("_FillValue", f32::NAN)?;
        for (key, value) in &encoding.attributes {
            var.put_attribute(key, value.as_str())?;
        }
    }

    for (key, value) in plan.provenance.string_attributes() {
        file.add_attribute(key, value)?;
    }
    file.add_attribute("buffer_degrees", plan.provenance.buffer_degrees)?;
    file.add_attribute("Conventions", "CF-1.6")?;

    let times: Vec<f64> = subset
        .slices
        .iter()
        .map(|s| plan.time_units.encode(s.time))
        .collect();
    if let Some(mut var) = file.variable_mut("time") {
        var.put_values(&times, ..)?;
    }
    if let Some(mut var) = file.variable_mut(LAT) {
        var.put_values(&subset.lat, ..)?;
    }
    if let Some(mut var) = file.variable_mut(LON) {
        var.put_values(&subset.lon, ..)?;
    }

    Ok(())
}
