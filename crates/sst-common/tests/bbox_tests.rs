//! Tests for BoundingBox operations.

use sst_common::bbox::{BboxError, BoundingBox};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.min_lon, -180.0);
    assert_eq!(bbox.min_lat, -90.0);
    assert_eq!(bbox.max_lon, 180.0);
    assert_eq!(bbox.max_lat, 90.0);
}

#[test]
fn test_validate_accepts_degenerate_point() {
    let bbox = BoundingBox::new(3.0, 4.0, 3.0, 4.0);
    assert!(bbox.validate().is_ok());
    assert!(bbox.contains_point(3.0, 4.0));
}

#[test]
fn test_validate_rejects_inverted() {
    let result = BoundingBox::new(10.0, 0.0, -10.0, 5.0).validate();
    assert!(matches!(result, Err(BboxError::Inverted(_))));

    let result = BoundingBox::new(0.0, 10.0, 5.0, -10.0).validate();
    assert!(matches!(result, Err(BboxError::Inverted(_))));
}

#[test]
fn test_validate_rejects_nan() {
    let result = BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).validate();
    assert!(matches!(result, Err(BboxError::NonFinite(_))));
}

// ============================================================================
// Buffer tests
// ============================================================================

#[test]
fn test_expand_is_monotonic() {
    let raw = BoundingBox::new(-5.5, 48.0, 2.25, 51.75);
    for buffer in [0.0, 0.05, 0.1, 1.0, 10.0] {
        let buffered = raw.expand(buffer).unwrap();
        assert!(buffered.contains_box(&raw), "buffer {} shrank the box", buffer);
        assert!((buffered.min_lon - (raw.min_lon - buffer)).abs() < 1e-9);
        assert!((buffered.max_lat - (raw.max_lat + buffer)).abs() < 1e-9);
    }
}

#[test]
fn test_expand_zero_is_identity() {
    let raw = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
    assert_eq!(raw.expand(0.0).unwrap(), raw);
}

#[test]
fn test_expand_keeps_invariant() {
    let raw = BoundingBox::new(1.0, 2.0, 1.0, 2.0);
    let buffered = raw.expand(0.1).unwrap();
    assert!(buffered.validate().is_ok());
}

// ============================================================================
// Union / containment tests
// ============================================================================

#[test]
fn test_union_covers_both() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(5.0, -5.0, 15.0, 5.0);
    let u = a.union(&b);
    assert_eq!(u, BoundingBox::new(0.0, -5.0, 15.0, 10.0));
    assert!(u.contains_box(&a));
    assert!(u.contains_box(&b));
}

#[test]
fn test_contains_point_edges_inclusive() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(!bbox.contains_point(10.0001, 5.0));
}

#[test]
fn test_display() {
    let bbox = BoundingBox::new(-1.0, -2.0, 3.0, 4.0);
    assert_eq!(bbox.to_string(), "[-1, -2, 3, 4]");
}
