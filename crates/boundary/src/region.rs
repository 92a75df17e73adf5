//! Resolve a boundary file into a buffered region of interest.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sst_common::BoundingBox;
use tracing::{debug, info};

use crate::error::{GeometryError, GeometryResult};
use crate::geojson;

/// Default buffer added on every side of the boundary envelope, in degrees.
pub const DEFAULT_BUFFER_DEGREES: f64 = 0.1;

/// The boundary envelope together with its buffered selection box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    /// Union envelope of the boundary geometries.
    pub raw: BoundingBox,
    pub buffer_degrees: f64,
    /// `raw` expanded by `buffer_degrees`; used for selection.
    pub bounds: BoundingBox,
}

impl RegionOfInterest {
    /// Buffer a raw envelope. Rejects negative or non-finite buffers.
    pub fn new(raw: BoundingBox, buffer_degrees: f64) -> GeometryResult<Self> {
        raw.validate()?;
        let bounds = raw.expand(buffer_degrees)?;
        Ok(Self {
            raw,
            buffer_degrees,
            bounds,
        })
    }
}

/// Read a boundary file and return its buffered region of interest.
///
/// GeoJSON (`.geojson`, `.json`) is always supported. Other extensions go
/// through OGR when built with the `gdal` feature.
pub fn resolve_boundary(path: &Path, buffer_degrees: f64) -> GeometryResult<RegionOfInterest> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let raw = match extension.as_str() {
        "geojson" | "json" => read_geojson_envelope(path)?,
        _ => read_other_envelope(path, extension)?,
    }
    .ok_or_else(|| GeometryError::Empty {
        path: path.to_path_buf(),
    })?;

    let region = RegionOfInterest::new(raw, buffer_degrees)?;
    info!(
        path = %path.display(),
        raw = %region.raw,
        buffer_degrees,
        bounds = %region.bounds,
        "Resolved region of interest"
    );
    Ok(region)
}

fn read_geojson_envelope(path: &Path) -> GeometryResult<Option<BoundingBox>> {
    let text = std::fs::read_to_string(path).map_err(|source| GeometryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |message| GeometryError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let geometries = geojson::parse_geometries(&text).map_err(parse_err)?;
    debug!(path = %path.display(), geometries = geometries.len(), "Parsed GeoJSON boundary");
    geojson::union_envelope(&geometries).map_err(parse_err)
}

#[cfg(feature = "gdal")]
fn read_other_envelope(path: &Path, _extension: String) -> GeometryResult<Option<BoundingBox>> {
    if !path.exists() {
        return Err(GeometryError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }
    crate::ogr::read_envelope(path)
}

#[cfg(not(feature = "gdal"))]
fn read_other_envelope(path: &Path, extension: String) -> GeometryResult<Option<BoundingBox>> {
    Err(GeometryError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sst_common::BboxError;

    #[test]
    fn test_region_expands_raw() {
        let raw = BoundingBox::new(-1.0, 0.0, 1.0, 1.0);
        let region = RegionOfInterest::new(raw, 0.5).unwrap();
        assert_eq!(region.bounds, BoundingBox::new(-1.5, -0.5, 1.5, 1.5));
        assert!(region.bounds.contains_box(&region.raw));
    }

    #[test]
    fn test_zero_buffer_is_identity() {
        let raw = BoundingBox::new(-1.0, 0.0, 1.0, 1.0);
        assert_eq!(RegionOfInterest::new(raw, 0.0).unwrap().bounds, raw);
    }

    #[test]
    fn test_negative_buffer_rejected() {
        let raw = BoundingBox::new(-1.0, 0.0, 1.0, 1.0);
        let err = RegionOfInterest::new(raw, -0.1).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::Bounds(BboxError::InvalidBuffer(_))
        ));
    }

    #[cfg(not(feature = "gdal"))]
    #[test]
    fn test_shapefile_unsupported_without_gdal() {
        let err = resolve_boundary(Path::new("/tmp/coast.shp"), 0.1).unwrap_err();
        match err {
            GeometryError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "shp"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
