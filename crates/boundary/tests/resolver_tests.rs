//! Boundary resolution against GeoJSON files on disk.

use boundary::{resolve_boundary, GeometryError};
use sst_common::BoundingBox;
use test_utils::{bbox, temp_test_dir, write_geojson_boundary};

#[test]
fn test_resolve_single_polygon_with_default_buffer() {
    let dir = temp_test_dir();
    let path = write_geojson_boundary(&dir.path().join("aoi.geojson"), &[bbox::FIXTURE_WINDOW])
        .expect("write boundary");

    let region = resolve_boundary(&path, boundary::DEFAULT_BUFFER_DEGREES).expect("resolve");

    assert_eq!(region.raw, BoundingBox::new(-1.0, 0.0, 1.0, 1.0));
    assert!((region.bounds.min_lon - -1.1).abs() < 1e-12);
    assert!((region.bounds.max_lat - 1.1).abs() < 1e-12);
    assert!(region.bounds.contains_box(&region.raw));
}

#[test]
fn test_resolve_unions_features() {
    let dir = temp_test_dir();
    let path = write_geojson_boundary(
        &dir.path().join("aoi.json"),
        &[(-3.0, -1.0, -2.0, 0.0), (2.0, 1.0, 3.0, 2.5)],
    )
    .expect("write boundary");

    let region = resolve_boundary(&path, 0.0).expect("resolve");
    assert_eq!(region.bounds, BoundingBox::new(-3.0, -1.0, 3.0, 2.5));
}

#[test]
fn test_buffer_monotonic() {
    let dir = temp_test_dir();
    let path = write_geojson_boundary(&dir.path().join("aoi.geojson"), &[bbox::FIXTURE_WINDOW])
        .expect("write boundary");

    let mut previous: Option<BoundingBox> = None;
    for buffer in [0.0, 0.05, 0.1, 1.0, 5.0] {
        let region = resolve_boundary(&path, buffer).expect("resolve");
        assert!(region.bounds.contains_box(&region.raw));
        if let Some(prev) = previous {
            assert!(region.bounds.contains_box(&prev));
        }
        previous = Some(region.bounds);
    }
}

#[test]
fn test_empty_feature_collection() {
    let dir = temp_test_dir();
    let path = write_geojson_boundary(&dir.path().join("empty.geojson"), &[])
        .expect("write boundary");

    let err = resolve_boundary(&path, 0.1).unwrap_err();
    assert!(matches!(err, GeometryError::Empty { .. }));
    assert!(err.to_string().contains("empty.geojson"));
}

#[test]
fn test_missing_file() {
    let dir = temp_test_dir();
    let err = resolve_boundary(&dir.path().join("missing.geojson"), 0.1).unwrap_err();
    assert!(matches!(err, GeometryError::Read { .. }));
}

#[test]
fn test_malformed_geojson() {
    let dir = temp_test_dir();
    let path = dir.path().join("bad.geojson");
    std::fs::write(&path, "{\"type\": \"FeatureCollection\", \"features\": [").unwrap();

    let err = resolve_boundary(&path, 0.1).unwrap_err();
    assert!(matches!(err, GeometryError::Parse { .. }));
}

#[test]
fn test_negative_buffer() {
    let dir = temp_test_dir();
    let path = write_geojson_boundary(&dir.path().join("aoi.geojson"), &[bbox::FIXTURE_WINDOW])
        .expect("write boundary");

    assert!(matches!(
        resolve_boundary(&path, -1.0).unwrap_err(),
        GeometryError::Bounds(_)
    ));
    assert!(resolve_boundary(&path, f64::NAN).is_err());
}
