//! GeoJSON geometry types for item footprints.

use serde::{Deserialize, Serialize};
use stac_common::BoundingBox;

/// GeoJSON geometry types accepted by the catalog.
///
/// Footprints are stored as polygons; points and multipolygons are accepted
/// for `intersects` search filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A point geometry.
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: [f64; 2],
    },

    /// A polygon geometry.
    Polygon {
        /// Array of linear rings (first is exterior, rest are holes).
        /// Each ring is an array of [longitude, latitude] coordinate pairs.
        coordinates: Vec<Vec<[f64; 2]>>,
    },

    /// A multi-polygon geometry.
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Create a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }

    /// Create a polygon geometry from a single exterior ring.
    pub fn polygon(ring: Vec<[f64; 2]>) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    /// The closed 5-point rectangle covering a bounding box, wound
    /// counter-clockwise.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Geometry::polygon(vec![
            [bbox.min_x, bbox.min_y],
            [bbox.max_x, bbox.min_y],
            [bbox.max_x, bbox.max_y],
            [bbox.min_x, bbox.max_y],
            [bbox.min_x, bbox.min_y],
        ])
    }

    /// The envelope of this geometry.
    pub fn bbox(&self) -> Option<BoundingBox> {
        let mut acc: Option<BoundingBox> = None;
        self.for_each_position(&mut |p| {
            let point = BoundingBox::new(p[0], p[1], p[0], p[1]);
            acc = Some(match acc {
                Some(b) => b.union(&point),
                None => point,
            });
        });
        acc
    }

    /// Validate geometry structure: finite coordinates, rings closed with at
    /// least four positions.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let mut finite = true;
        self.for_each_position(&mut |p| {
            if !p[0].is_finite() || !p[1].is_finite() {
                finite = false;
            }
        });
        if !finite {
            return Err(GeometryError::NonFiniteCoordinate);
        }

        match self {
            Geometry::Point { .. } => Ok(()),
            Geometry::Polygon { coordinates } => validate_rings(coordinates),
            Geometry::MultiPolygon { coordinates } => {
                if coordinates.is_empty() {
                    return Err(GeometryError::EmptyGeometry);
                }
                coordinates.iter().try_for_each(|p| validate_rings(p))
            }
        }
    }

    fn for_each_position(&self, f: &mut impl FnMut(&[f64; 2])) {
        match self {
            Geometry::Point { coordinates } => f(coordinates),
            Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().for_each(f);
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().for_each(f);
            }
        }
    }
}

fn validate_rings(rings: &[Vec<[f64; 2]>]) -> Result<(), GeometryError> {
    if rings.is_empty() {
        return Err(GeometryError::EmptyGeometry);
    }
    for ring in rings {
        if ring.len() < 4 {
            return Err(GeometryError::RingTooShort(ring.len()));
        }
        if ring.first() != ring.last() {
            return Err(GeometryError::RingNotClosed);
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    #[error("Geometry has no coordinates")]
    EmptyGeometry,

    #[error("Polygon ring has {0} positions, need at least 4")]
    RingTooShort(usize),

    #[error("Polygon ring is not closed")]
    RingNotClosed,

    #[error("Geometry contains a non-finite coordinate")]
    NonFiniteCoordinate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bbox_is_closed_and_valid() {
        let bbox = BoundingBox::new(126.0, 36.0, 127.0, 37.0);
        let geom = Geometry::from_bbox(&bbox);
        assert!(geom.validate().is_ok());
        assert_eq!(geom.bbox(), Some(bbox));

        if let Geometry::Polygon { coordinates } = &geom {
            assert_eq!(coordinates[0].len(), 5);
            assert_eq!(coordinates[0].first(), coordinates[0].last());
        } else {
            panic!("expected polygon");
        }
    }

    #[test]
    fn test_geojson_tagging() {
        let geom = Geometry::from_bbox(&BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let json = serde_json::to_value(&geom).unwrap();
        assert_eq!(json["type"], "Polygon");

        let parsed: Geometry =
            serde_json::from_str(r#"{"type":"Point","coordinates":[126.5,36.5]}"#).unwrap();
        assert_eq!(parsed, Geometry::point(126.5, 36.5));
    }

    #[test]
    fn test_open_ring_rejected() {
        let geom = Geometry::polygon(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(geom.validate(), Err(GeometryError::RingNotClosed));
    }

    #[test]
    fn test_short_ring_rejected() {
        let geom = Geometry::polygon(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
        assert_eq!(geom.validate(), Err(GeometryError::RingTooShort(3)));
    }

    #[test]
    fn test_non_finite_rejected() {
        let geom = Geometry::point(f64::NAN, 0.0);
        assert_eq!(geom.validate(), Err(GeometryError::NonFiniteCoordinate));
    }

    #[test]
    fn test_multipolygon_bbox() {
        let geom = Geometry::MultiPolygon {
            coordinates: vec![
                vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]],
            ],
        };
        assert_eq!(geom.bbox(), Some(BoundingBox::new(0.0, 0.0, 6.0, 6.0)));
    }
}
