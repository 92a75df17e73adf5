//! Synthetic input files for sst-merge tests.
//!
//! [`SstFileSpec`] describes a small OSTIA-like NetCDF file: a time axis in
//! seconds since 1981-01-01, a regular lat/lon grid under a chosen naming
//! convention, and one or more SST-like data variables. Files are tiny so
//! tests can write dozens of them into a temporary directory.

use std::path::{Path, PathBuf};

use crate::generators::{
    packed_raw_value, regular_axis, sst_value, FLOAT_FILL_VALUE, PACKED_ADD_OFFSET,
    PACKED_FILL_VALUE, PACKED_SCALE_FACTOR,
};

/// CF units of the time coordinate in every fixture.
pub const FIXTURE_TIME_UNITS: &str = "seconds since 1981-01-01 00:00:00";

/// Seconds in a day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Common bounding box definitions for testing, as
/// `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Covers the default fixture grid completely.
    pub const FIXTURE_FULL: (f64, f64, f64, f64) = (-5.0, -2.0, 4.0, 3.0);

    /// Interior window of the default fixture grid.
    pub const FIXTURE_WINDOW: (f64, f64, f64, f64) = (-1.0, 0.0, 1.0, 1.0);

    /// Entirely outside the default fixture grid.
    pub const FIXTURE_OUTSIDE: (f64, f64, f64, f64) = (100.0, 50.0, 110.0, 60.0);

    /// Invalid bbox (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// Description of one synthetic SST file.
#[derive(Debug, Clone)]
pub struct SstFileSpec {
    pub lon_name: String,
    pub lat_name: String,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// One time step per entry, as whole days since 1981-01-01. Each time
    /// step is stamped at 12:00 like OSTIA analyses.
    pub days: Vec<i64>,
    pub variables: Vec<String>,
    /// Store data as `i16` with scale/offset instead of `f32`.
    pub packed: bool,
    /// (row, col) cells written as the fill value in every time step.
    pub fill_cells: Vec<(usize, usize)>,
}

impl SstFileSpec {
    /// Default grid: lon -5..=4 step 1 (10 columns), lat -2..=3 step 1
    /// (6 rows), variable `analysed_sst`.
    pub fn new(days: Vec<i64>) -> Self {
        Self {
            lon_name: "lon".to_string(),
            lat_name: "lat".to_string(),
            lon: regular_axis(-5.0, 1.0, 10),
            lat: regular_axis(-2.0, 1.0, 6),
            days,
            variables: vec!["analysed_sst".to_string()],
            packed: false,
            fill_cells: Vec::new(),
        }
    }

    /// A single-day file.
    pub fn single_day(day: i64) -> Self {
        Self::new(vec![day])
    }

    /// Use `longitude`/`latitude` for the horizontal axes.
    pub fn with_long_names(mut self) -> Self {
        self.lon_name = "longitude".to_string();
        self.lat_name = "latitude".to_string();
        self
    }

    /// Use arbitrary names for the horizontal axes.
    pub fn with_axis_names(mut self, lon: &str, lat: &str) -> Self {
        self.lon_name = lon.to_string();
        self.lat_name = lat.to_string();
        self
    }

    pub fn with_grid(mut self, lon: Vec<f64>, lat: Vec<f64>) -> Self {
        self.lon = lon;
        self.lat = lat;
        self
    }

    pub fn with_variables(mut self, names: &[&str]) -> Self {
        self.variables = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }

    pub fn with_fill_cells(mut self, cells: &[(usize, usize)]) -> Self {
        self.fill_cells = cells.to_vec();
        self
    }

    /// Raw time coordinate values in [`FIXTURE_TIME_UNITS`].
    pub fn time_values(&self) -> Vec<i32> {
        self.days
            .iter()
            .map(|&d| (d * SECONDS_PER_DAY + 12 * 3600) as i32)
            .collect()
    }
}

/// Writes a synthetic SST file described by `spec` to `path`.
///
/// Unpacked variables hold [`sst_value`]`(day, row, col)`; packed variables
/// hold [`packed_raw_value`]`(row, col)` with the packing constants from
/// [`crate::generators`].
pub fn write_sst_file(path: &Path, spec: &SstFileSpec) -> Result<PathBuf, netcdf::Error> {
    let mut file = netcdf::create(path)?;

    file.add_dimension("time", spec.days.len())?;
    file.add_dimension(&spec.lat_name, spec.lat.len())?;
    file.add_dimension(&spec.lon_name, spec.lon.len())?;

    {
        let mut time_var = file.add_variable::<i32>("time", &["time"])?;
        time_var.put_attribute("standard_name", "time")?;
        time_var.put_attribute("units", FIXTURE_TIME_UNITS)?;
        time_var.put_attribute("calendar", "gregorian")?;
        time_var.put_values(&spec.time_values(), ..)?;
    }

    {
        let mut lat_var = file.add_variable::<f64>(&spec.lat_name, &[spec.lat_name.as_str()])?;
        lat_var.put_attribute("standard_name", "latitude")?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_values(&spec.lat, ..)?;
    }

    {
        let mut lon_var = file.add_variable::<f64>(&spec.lon_name, &[spec.lon_name.as_str()])?;
        lon_var.put_attribute("standard_name", "longitude")?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_values(&spec.lon, ..)?;
    }

    let dims = ["time", spec.lat_name.as_str(), spec.lon_name.as_str()];
    let (rows, cols) = (spec.lat.len(), spec.lon.len());

    for name in &spec.variables {
        if spec.packed {
            let mut var = file.add_variable::<i16>(name, &dims)?;
            var.put_attribute("_FillValue", PACKED_FILL_VALUE)?;
            var.put_attribute("scale_factor", PACKED_SCALE_FACTOR)?;
            var.put_attribute("add_offset", PACKED_ADD_OFFSET)?;
            var.put_attribute("units", "kelvin")?;
            var.put_attribute("long_name", "analysed sea surface temperature")?;

            for t in 0..spec.days.len() {
                let mut slab = Vec::with_capacity(rows * cols);
                for row in 0..rows {
                    for col in 0..cols {
                        if spec.fill_cells.contains(&(row, col)) {
                            slab.push(PACKED_FILL_VALUE);
                        } else {
                            slab.push(packed_raw_value(row, col));
                        }
                    }
                }
                var.put_values(&slab, (t, .., ..))?;
            }
        } else {
            let mut var = file.add_variable::<f32>(name, &dims)?;
            var.put_attribute("_FillValue", FLOAT_FILL_VALUE)?;
            var.put_attribute("units", "kelvin")?;
            var.put_attribute("long_name", "analysed sea surface temperature")?;

            for (t, &day) in spec.days.iter().enumerate() {
                let mut slab = Vec::with_capacity(rows * cols);
                for row in 0..rows {
                    for col in 0..cols {
                        if spec.fill_cells.contains(&(row, col)) {
                            slab.push(FLOAT_FILL_VALUE);
                        } else {
                            slab.push(sst_value(day, row, col));
                        }
                    }
                }
                var.put_values(&slab, (t, .., ..))?;
            }
        }
    }

    file.add_attribute("title", "synthetic OSTIA fixture")?;
    file.add_attribute("Conventions", "CF-1.4")?;

    Ok(path.to_path_buf())
}

/// Writes one single-day OSTIA-named file per day into `dir`.
pub fn write_daily_series(
    dir: &Path,
    days: &[i64],
    template: &SstFileSpec,
) -> Result<Vec<PathBuf>, netcdf::Error> {
    days.iter()
        .map(|&day| {
            let spec = SstFileSpec {
                days: vec![day],
                ..template.clone()
            };
            write_sst_file(&crate::paths::ostia_file_path(dir, day), &spec)
        })
        .collect()
}

/// GeoJSON polygon ring for a box.
fn box_ring(b: (f64, f64, f64, f64)) -> serde_json::Value {
    let (min_lon, min_lat, max_lon, max_lat) = b;
    serde_json::json!([[
        [min_lon, min_lat],
        [max_lon, min_lat],
        [max_lon, max_lat],
        [min_lon, max_lat],
        [min_lon, min_lat]
    ]])
}

/// GeoJSON FeatureCollection text with one polygon feature per box.
pub fn geojson_boxes(boxes: &[(f64, f64, f64, f64)]) -> String {
    let features: Vec<serde_json::Value> = boxes
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            serde_json::json!({
                "type": "Feature",
                "properties": { "id": i },
                "geometry": { "type": "Polygon", "coordinates": box_ring(b) }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features
    })
    .to_string()
}

/// Writes a GeoJSON boundary with one polygon per box.
pub fn write_geojson_boundary(
    path: &Path,
    boxes: &[(f64, f64, f64, f64)],
) -> std::io::Result<PathBuf> {
    std::fs::write(path, geojson_boxes(boxes))?;
    Ok(path.to_path_buf())
}
