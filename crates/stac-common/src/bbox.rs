//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in EPSG:4326 (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a STAC `bbox` query parameter: "minx,miny,maxx,maxy" or the
    /// 6-value 3D form "minx,miny,minz,maxx,maxy,maxz" (elevation discarded).
    pub fn from_query_string(s: &str) -> Result<Self, BboxParseError> {
        let values: Result<Vec<f64>, _> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
            })
            .collect();
        let values = values?;

        Self::from_values(&values).ok_or_else(|| BboxParseError::InvalidFormat(s.to_string()))
    }

    /// Build from a flat 4- or 6-value STAC bbox array.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let bbox = match values.len() {
            4 => Self::new(values[0], values[1], values[2], values[3]),
            6 => Self::new(values[0], values[1], values[3], values[4]),
            _ => return None,
        };
        bbox.is_ordered().then_some(bbox)
    }

    fn is_ordered(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Grow this bbox to cover another (used when aggregating extents).
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Flat STAC representation: [west, south, east, north].
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bbox: {0}. Expected 4 or 6 comma-separated numbers in min/max order")]
    InvalidFormat(String),

    #[error("Invalid number in bbox: {0}")]
    InvalidNumber(String),
}
