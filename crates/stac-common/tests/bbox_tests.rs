//! Comprehensive tests for BoundingBox operations.

use stac_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.min_x, -180.0);
    assert_eq!(bbox.min_y, -90.0);
    assert_eq!(bbox.max_x, 180.0);
    assert_eq!(bbox.max_y, 90.0);
}

#[test]
fn test_bbox_copy() {
    let bbox1 = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let bbox2 = bbox1;
    assert_eq!(bbox1, bbox2);
}

// ============================================================================
// from_query_string tests
// ============================================================================

#[test]
fn test_parse_bbox_integer() {
    let bbox = BoundingBox::from_query_string("0,0,100,100").unwrap();
    assert_eq!(bbox.min_x, 0.0);
    assert_eq!(bbox.max_y, 100.0);
}

#[test]
fn test_parse_bbox_floating() {
    let bbox = BoundingBox::from_query_string("-125.5,24.75,-66.25,50.125").unwrap();
    assert!((bbox.min_x - (-125.5)).abs() < 0.001);
    assert!((bbox.min_y - 24.75).abs() < 0.001);
    assert!((bbox.max_x - (-66.25)).abs() < 0.001);
    assert!((bbox.max_y - 50.125).abs() < 0.001);
}

#[test]
fn test_parse_bbox_whitespace_tolerant() {
    let bbox = BoundingBox::from_query_string("126.5, 36.7, 127.1, 37.0").unwrap();
    assert_eq!(bbox.min_x, 126.5);
}

#[test]
fn test_parse_bbox_six_values() {
    let bbox = BoundingBox::from_query_string("126.5,36.7,-10.0,127.1,37.0,250.0").unwrap();
    assert_eq!(bbox.min_x, 126.5);
    assert_eq!(bbox.min_y, 36.7);
    assert_eq!(bbox.max_x, 127.1);
    assert_eq!(bbox.max_y, 37.0);
}

#[test]
fn test_parse_bbox_invalid_number() {
    let err = BoundingBox::from_query_string("a,0,1,1").unwrap_err();
    assert!(matches!(err, BboxParseError::InvalidNumber(_)));
}

#[test]
fn test_parse_bbox_wrong_arity() {
    let err = BoundingBox::from_query_string("0,0,1,1,2").unwrap_err();
    assert!(matches!(err, BboxParseError::InvalidFormat(_)));
}

#[test]
fn test_parse_bbox_inverted() {
    let err = BoundingBox::from_query_string("10,0,-10,5").unwrap_err();
    assert!(matches!(err, BboxParseError::InvalidFormat(_)));
}

// ============================================================================
// Geometry predicate tests
// ============================================================================

#[test]
fn test_intersects() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
    let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

    assert!(a.intersects(&b));
    assert!(b.intersects(&a));
    assert!(!a.intersects(&c));
}

#[test]
fn test_intersects_touching_edge() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    assert!(a.intersects(&b));
}

#[test]
fn test_union_covers_both() {
    let a = BoundingBox::new(126.0, 36.0, 127.0, 37.0);
    let b = BoundingBox::new(128.0, 35.0, 129.0, 36.5);
    let u = a.union(&b);
    assert!(u.contains_point(126.5, 36.5));
    assert!(u.contains_point(128.5, 35.5));
    assert_eq!(u.to_vec(), vec![126.0, 35.0, 129.0, 37.0]);
}

#[test]
fn test_contains_point() {
    let bbox = BoundingBox::new(126.0, 36.0, 127.0, 37.0);
    assert!(bbox.contains_point(126.5, 36.5));
    assert!(bbox.contains_point(126.0, 36.0));
    assert!(!bbox.contains_point(125.9, 36.5));
}

#[test]
fn test_dimensions() {
    let bbox = BoundingBox::new(126.0, 36.0, 127.5, 37.0);
    assert!((bbox.width() - 1.5).abs() < 1e-9);
    assert!((bbox.height() - 1.0).abs() < 1e-9);
}
