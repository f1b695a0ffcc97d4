//! STAC Item and its embedded asset/property types.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use stac_common::{CatalogError, CatalogResult};

use crate::geometry::Geometry;
use crate::types::Link;
use crate::STAC_VERSION;

/// A property value. STAC `properties` are open maps, but the catalog only
/// admits this closed set of variants so downstream code never deals with
/// untyped JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

/// A named asset reference embedded in an Item. Never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    /// Resolvable URL of the asset.
    pub href: String,

    /// Media type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Asset {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            type_: None,
            title: None,
            roles: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

/// The temporal form of an Item: a single instant, or a bounding interval.
///
/// Exactly one form exists per Item, which makes a partial
/// start/end pair unrepresentable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ItemTemporal {
    Instant(DateTime<Utc>),
    Interval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl ItemTemporal {
    /// Inclusive [start, end] range covered by this temporal form.
    pub fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            ItemTemporal::Instant(t) => (*t, *t),
            ItemTemporal::Interval { start, end } => (*start, *end),
        }
    }
}

/// One cataloged asset record: geometry, temporal extent, properties, and
/// asset links for a single source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Derived from the source filename; stable across re-ingestion and
    /// unique within the owning collection.
    pub id: String,

    /// Owning collection.
    pub collection_id: String,

    /// Footprint. Always present and valid.
    pub geometry: Geometry,

    /// Flat envelope, 4 or 6 numbers, consistent with the geometry.
    pub bbox: Option<Vec<f64>>,

    /// Instant or bounding interval.
    pub temporal: ItemTemporal,

    /// Open property map; must contain `year`, `region`, and `zone`.
    pub properties: BTreeMap<String, PropertyValue>,

    /// Role name (`data`, `thumbnail`, ...) to asset reference.
    pub assets: BTreeMap<String, Asset>,

    /// Canonical source location. Unique per Item; the ingestion
    /// idempotency key.
    pub source_path: String,

    pub links: Vec<Link>,
}

impl Item {
    /// Validate the invariants enforced at the builder and store boundary:
    /// valid geometry, bbox arity, and the minimum required properties.
    pub fn validate(&self) -> CatalogResult<()> {
        self.geometry
            .validate()
            .map_err(|e| CatalogError::InvalidGeometry(e.to_string()))?;

        if let Some(bbox) = &self.bbox {
            if bbox.len() != 4 && bbox.len() != 6 {
                return Err(CatalogError::InvalidGeometry(format!(
                    "bbox has {} values, expected 4 or 6",
                    bbox.len()
                )));
            }
        }

        match self.properties.get("year") {
            Some(PropertyValue::Number(_)) => {}
            _ => {
                return Err(CatalogError::InternalError(
                    "item properties missing numeric 'year'".to_string(),
                ))
            }
        }
        for key in ["region", "zone"] {
            match self.properties.get(key) {
                Some(PropertyValue::String(_)) => {}
                _ => {
                    return Err(CatalogError::InternalError(format!(
                        "item properties missing string '{}'",
                        key
                    )))
                }
            }
        }

        Ok(())
    }

    /// Render as a GeoJSON Feature per the STAC Item spec. The temporal form
    /// is merged into `properties` as `datetime` or
    /// `start_datetime`/`end_datetime`.
    pub fn to_feature(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for (k, v) in &self.properties {
            properties.insert(k.clone(), serde_json::to_value(v).unwrap_or_default());
        }
        match &self.temporal {
            ItemTemporal::Instant(t) => {
                properties.insert("datetime".to_string(), rfc3339(t).into());
            }
            ItemTemporal::Interval { start, end } => {
                properties.insert("datetime".to_string(), serde_json::Value::Null);
                properties.insert("start_datetime".to_string(), rfc3339(start).into());
                properties.insert("end_datetime".to_string(), rfc3339(end).into());
            }
        }

        serde_json::json!({
            "type": "Feature",
            "stac_version": STAC_VERSION,
            "id": self.id,
            "collection": self.collection_id,
            "geometry": self.geometry,
            "bbox": self.bbox,
            "properties": properties,
            "assets": self.assets,
            "links": self.links,
        })
    }
}

fn rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
