//! Horizontal coordinate naming.
//!
//! Files name their horizontal axes either `longitude`/`latitude` or
//! `lon`/`lat`. [`normalize`] picks the first accepted pair present in the
//! dataset and exposes the axes under the canonical names `lon`/`lat`.

use netcdf_parser::VariableInfo;
use tracing::debug;

use crate::dataset::VirtualDataset;
use crate::error::{MergeError, Result};
use crate::events::{MergeEvent, MergeObserver, Stage, StageTimer};

/// Canonical longitude name.
pub const LON: &str = "lon";
/// Canonical latitude name.
pub const LAT: &str = "lat";

/// Accepted (longitude, latitude) name pairs, in priority order.
pub const COORDINATE_ALIASES: &[(&str, &str)] = &[("longitude", "latitude"), ("lon", "lat")];

/// A dataset whose horizontal axes have been identified.
#[derive(Debug, Clone)]
pub struct NormalizedDataset {
    pub dataset: VirtualDataset,
    /// Name of the longitude axis in the input files.
    pub lon_source: String,
    /// Name of the latitude axis in the input files.
    pub lat_source: String,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Data variables, all laid out as (time, lat, lon).
    pub variables: Vec<VariableInfo>,
}

/// Pick the first alias pair whose both names are coordinates of `dataset`.
pub fn resolve_aliases(dataset: &VirtualDataset) -> Result<(&'static str, &'static str)> {
    COORDINATE_ALIASES
        .iter()
        .copied()
        .find(|(lon, lat)| {
            dataset.spatial_coordinates.contains_key(*lon)
                && dataset.spatial_coordinates.contains_key(*lat)
        })
        .ok_or_else(|| MergeError::UnsupportedCoordinate {
            searched: COORDINATE_ALIASES
                .iter()
                .map(|(lon, lat)| format!("{{{}, {}}}", lon, lat))
                .collect::<Vec<_>>()
                .join(", "),
            found: dataset.coordinate_names().join(", "),
        })
}

/// Identify the horizontal axes and the (time, lat, lon) data variables.
pub fn normalize(
    dataset: VirtualDataset,
    observer: &dyn MergeObserver,
) -> Result<NormalizedDataset> {
    let _timer = StageTimer::start(observer, Stage::Normalize);

    let (lon_name, lat_name) = resolve_aliases(&dataset)?;
    let expected = [
        dataset.time_dimension.as_str(),
        lat_name,
        lon_name,
    ];

    let mut variables = Vec::new();
    for var in &dataset.variables {
        if var.dimensions.iter().map(String::as_str).eq(expected) {
            variables.push(var.clone());
        } else if var.dimensions.contains(&dataset.time_dimension) {
            return Err(MergeError::UnsupportedLayout {
                variable: var.name.clone(),
                dimensions: var.dimensions.clone(),
                expected: expected.join(", "),
            });
        } else {
            debug!(variable = %var.name, "Skipping variable without a time dimension");
        }
    }

    if variables.is_empty() {
        let file = dataset
            .files
            .first()
            .map(|f| f.path.clone())
            .unwrap_or_default();
        return Err(MergeError::schema(
            file,
            format!("no data variables laid out as ({})", expected.join(", ")),
        ));
    }

    let lon = dataset
        .spatial_coordinates
        .get(lon_name)
        .cloned()
        .unwrap_or_default();
    let lat = dataset
        .spatial_coordinates
        .get(lat_name)
        .cloned()
        .unwrap_or_default();

    observer.on_event(&MergeEvent::CoordinatesNormalized {
        lon: lon_name.to_string(),
        lat: lat_name.to_string(),
    });

    Ok(NormalizedDataset {
        dataset,
        lon_source: lon_name.to_string(),
        lat_source: lat_name.to_string(),
        lon,
        lat,
        variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeConfig;
    use crate::dataset::VirtualDatasetBuilder;
    use crate::events::RecordingObserver;
    use crate::source::NetCdfSource;
    use std::path::PathBuf;
    use test_utils::{temp_test_dir, write_daily_series, write_sst_file, SstFileSpec};

    fn dataset(paths: &[PathBuf]) -> VirtualDataset {
        let config = MergeConfig::default();
        VirtualDatasetBuilder::new(&NetCdfSource, &config, &RecordingObserver::new())
            .build(paths)
            .unwrap()
    }

    #[test]
    fn test_short_names_resolve() {
        let dir = temp_test_dir();
        let paths = write_daily_series(dir.path(), &[1], &SstFileSpec::new(vec![])).unwrap();

        let normalized = normalize(dataset(&paths), &RecordingObserver::new()).unwrap();
        assert_eq!(normalized.lon_source, "lon");
        assert_eq!(normalized.lat_source, "lat");
        assert_eq!(normalized.lon.len(), 10);
        assert_eq!(normalized.lat.len(), 6);
        assert_eq!(normalized.variables.len(), 1);
    }

    #[test]
    fn test_long_names_resolve_to_canonical() {
        let dir = temp_test_dir();
        let template = SstFileSpec::new(vec![]).with_long_names();
        let paths = write_daily_series(dir.path(), &[1], &template).unwrap();

        let observer = RecordingObserver::new();
        let normalized = normalize(dataset(&paths), &observer).unwrap();
        assert_eq!(normalized.lon_source, "longitude");
        assert_eq!(normalized.lat_source, "latitude");
        assert_eq!(normalized.lon, template.lon);
        assert!(observer.events().contains(&MergeEvent::CoordinatesNormalized {
            lon: "longitude".to_string(),
            lat: "latitude".to_string(),
        }));
    }

    #[test]
    fn test_unknown_axis_names_rejected() {
        let dir = temp_test_dir();
        let template = SstFileSpec::new(vec![]).with_axis_names("x", "y");
        let paths = write_daily_series(dir.path(), &[1], &template).unwrap();

        match normalize(dataset(&paths), &RecordingObserver::new()) {
            Err(MergeError::UnsupportedCoordinate { searched, found }) => {
                assert_eq!(searched, "{longitude, latitude}, {lon, lat}");
                assert_eq!(found, "x, y");
            }
            other => panic!("expected unsupported coordinate, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_transposed_variable_rejected() {
        let dir = temp_test_dir();
        let path = dir.path().join("transposed.nc");
        write_sst_file(&path, &SstFileSpec::single_day(1)).unwrap();
        {
            let mut file = netcdf::append(&path).unwrap();
            let mut var = file
                .add_variable::<f32>("mask", &["time", "lon", "lat"])
                .unwrap();
            var.put_values(&vec![0.0f32; 60], (0, .., ..)).unwrap();
        }

        match normalize(dataset(&[path]), &RecordingObserver::new()) {
            Err(MergeError::UnsupportedLayout { variable, dimensions, .. }) => {
                assert_eq!(variable, "mask");
                assert_eq!(dimensions, vec!["time", "lon", "lat"]);
            }
            other => panic!("expected unsupported layout, got {:?}", other.is_ok()),
        }
    }
}
