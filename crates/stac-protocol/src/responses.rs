//! STAC API response documents.
//!
//! Landing page, conformance declaration, item collections, and structured
//! exception bodies.

use serde::{Deserialize, Serialize};

use crate::types::Link;
use crate::STAC_VERSION;

/// Conformance class URIs declared by this implementation.
pub mod conformance {
    pub const CORE: &str = "https://api.stacspec.org/v1.0.0/core";
    pub const COLLECTIONS: &str = "https://api.stacspec.org/v1.0.0/collections";
    pub const OGCAPI_FEATURES: &str = "https://api.stacspec.org/v1.0.0/ogcapi-features";
    pub const ITEM_SEARCH: &str = "https://api.stacspec.org/v1.0.0/item-search";
    pub const OGC_FEATURES_CORE: &str =
        "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core";
    pub const OGC_FEATURES_GEOJSON: &str =
        "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson";
}

/// Landing page (STAC Catalog document) for the API root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandingPage {
    #[serde(rename = "type")]
    pub type_: String,

    pub stac_version: String,

    pub id: String,

    pub title: String,

    pub description: String,

    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,

    pub links: Vec<Link>,
}

impl LandingPage {
    /// Create a landing page with the standard navigation links.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        base_url: &str,
    ) -> Self {
        let links = vec![
            Link::new(base_url, "self")
                .with_type("application/json")
                .with_title("This document"),
            Link::new(base_url, "root").with_type("application/json"),
            Link::new(format!("{}/conformance", base_url), "conformance")
                .with_type("application/json")
                .with_title("Conformance classes"),
            Link::new(format!("{}/collections", base_url), "data")
                .with_type("application/json")
                .with_title("Collections"),
            Link::new(format!("{}/search", base_url), "search")
                .with_type("application/geo+json")
                .with_title("Item search"),
            Link::new(format!("{}/search", base_url), "search")
                .with_type("application/geo+json")
                .with_method("POST"),
        ];

        Self {
            type_: "Catalog".to_string(),
            stac_version: STAC_VERSION.to_string(),
            id: id.into(),
            title: title.into(),
            description: description.into(),
            conforms_to: ConformanceClasses::current().conforms_to,
            links,
        }
    }

    /// Add a child link for a collection.
    pub fn with_child(mut self, base_url: &str, collection_id: &str) -> Self {
        self.links.push(
            Link::new(
                format!("{}/collections/{}", base_url, collection_id),
                "child",
            )
            .with_type("application/json"),
        );
        self
    }
}

/// Conformance declaration response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConformanceClasses {
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
}

impl ConformanceClasses {
    /// The fixed capability list for the current implementation.
    pub fn current() -> Self {
        Self {
            conforms_to: vec![
                conformance::CORE.to_string(),
                conformance::COLLECTIONS.to_string(),
                conformance::OGCAPI_FEATURES.to_string(),
                conformance::ITEM_SEARCH.to_string(),
                conformance::OGC_FEATURES_CORE.to_string(),
                conformance::OGC_FEATURES_GEOJSON.to_string(),
            ],
        }
    }

    /// Check if a conformance class is declared.
    pub fn contains(&self, class: &str) -> bool {
        self.conforms_to.contains(&class.to_string())
    }
}

/// A page of Items rendered as a GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemCollection {
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<serde_json::Value>,

    #[serde(rename = "numberReturned")]
    pub number_returned: usize,

    pub links: Vec<Link>,
}

impl ItemCollection {
    pub fn new(features: Vec<serde_json::Value>) -> Self {
        let number_returned = features.len();
        Self {
            type_: "FeatureCollection".to_string(),
            features,
            number_returned,
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }
}

/// Structured error body returned to API callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// Exception type identifier.
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExceptionResponse {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            type_: "https://api.stacspec.org/v1.0.0/errors#bad-request".to_string(),
            title: Some("Bad Request".to_string()),
            status: Some(400),
            detail: Some(detail.into()),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            type_: "https://api.stacspec.org/v1.0.0/errors#not-found".to_string(),
            title: Some("Not Found".to_string()),
            status: Some(404),
            detail: Some(detail.into()),
        }
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self {
            type_: "https://api.stacspec.org/v1.0.0/errors#server-error".to_string(),
            title: Some("Internal Server Error".to_string()),
            status: Some(500),
            detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_page_structure() {
        let landing = LandingPage::new(
            "spatial-asset-catalog",
            "Spatial Asset Catalog",
            "STAC API for NAS COG assets.",
            "http://localhost:8084/stac",
        );

        assert!(landing.links.iter().any(|l| l.rel == "self"));
        assert!(landing.links.iter().any(|l| l.rel == "conformance"));
        assert!(landing.links.iter().any(|l| l.rel == "data"));
        assert!(landing.links.iter().any(|l| l.rel == "search"));
    }

    #[test]
    fn test_landing_page_json() {
        let landing = LandingPage::new("cat", "Catalog", "desc", "http://localhost:8084/stac")
            .with_child("http://localhost:8084/stac", "nas-assets");

        let parsed = serde_json::to_value(&landing).unwrap();
        assert_eq!(parsed["type"], "Catalog");
        assert!(parsed["conformsTo"].as_array().unwrap().len() >= 4);
        assert!(parsed["links"]
            .as_array()
            .unwrap()
            .iter()
            .any(|l| l["rel"] == "child" && l["href"].as_str().unwrap().ends_with("nas-assets")));
    }

    #[test]
    fn test_conformance_classes() {
        let conf = ConformanceClasses::current();

        assert!(conf.contains(conformance::CORE));
        assert!(conf.contains(conformance::COLLECTIONS));
        assert!(conf.contains(conformance::ITEM_SEARCH));
    }

    #[test]
    fn test_conformance_json() {
        let conf = ConformanceClasses::current();
        let parsed = serde_json::to_value(&conf).unwrap();
        let conforms_to = parsed.get("conformsTo").unwrap().as_array().unwrap();

        assert!(!conforms_to.is_empty());
        assert!(conforms_to
            .iter()
            .any(|v| v.as_str().unwrap().contains("core")));
    }

    #[test]
    fn test_empty_item_collection_is_normal() {
        let page = ItemCollection::new(Vec::new());
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["numberReturned"], 0);
        assert_eq!(json["features"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_exception_shape() {
        let exc = ExceptionResponse::bad_request("invalid bbox");
        assert_eq!(exc.status, Some(400));
        assert!(exc.detail.unwrap().contains("invalid bbox"));
    }
}
