//! STAC Collection document.

use serde::{Deserialize, Serialize};

use crate::types::{Extent, Link, Provider};
use crate::STAC_VERSION;

/// A named group of Items sharing provenance, with an aggregate
/// spatial/temporal extent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    #[serde(rename = "type", default = "collection_type")]
    pub type_: String,

    pub stac_version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub description: String,

    pub license: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,

    /// Bounds of every member Item's geometry and datetime. Recomputed when
    /// membership changes; may be absent until the first recompute and is
    /// then derived lazily on read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,

    /// Storage root this collection was ingested from, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
}

fn collection_type() -> String {
    "Collection".to_string()
}

impl Collection {
    /// Create a collection with defaults for a freshly declared group.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            type_: collection_type(),
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: Vec::new(),
            id: id.into(),
            title: None,
            description: String::new(),
            license: "proprietary".to_string(),
            keywords: Vec::new(),
            providers: Vec::new(),
            extent: None,
            links: Vec::new(),
            source_root: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source_root(mut self, root: impl Into<String>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    /// Attach the standard self/items/parent navigation links.
    pub fn build_links(&mut self, base_url: &str) {
        self.links.extend([
            Link::new(format!("{}/collections/{}", base_url, self.id), "self")
                .with_type("application/json"),
            Link::new(
                format!("{}/collections/{}/items", base_url, self.id),
                "items",
            )
            .with_type("application/geo+json"),
            Link::new(base_url, "parent").with_type("application/json"),
            Link::new(base_url, "root").with_type("application/json"),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_defaults() {
        let collection = Collection::new("nas-assets")
            .with_title("NAS Assets")
            .with_description("Assets indexed from NAS storage.");

        assert_eq!(collection.type_, "Collection");
        assert_eq!(collection.stac_version, "1.0.0");
        assert_eq!(collection.license, "proprietary");
        assert!(collection.extent.is_none());
    }

    #[test]
    fn test_build_links() {
        let mut collection = Collection::new("nas-assets");
        collection.build_links("http://localhost:8084/stac");

        assert!(collection
            .links
            .iter()
            .any(|l| l.rel == "self" && l.href.ends_with("/collections/nas-assets")));
        assert!(collection
            .links
            .iter()
            .any(|l| l.rel == "items" && l.href.ends_with("/items")));
    }

    #[test]
    fn test_serialization_field_names() {
        let collection = Collection::new("c1");
        let json = serde_json::to_value(&collection).unwrap();

        assert_eq!(json["type"], "Collection");
        assert_eq!(json["stac_version"], "1.0.0");
        // Empty optional groups are omitted entirely
        assert!(json.get("keywords").is_none());
        assert!(json.get("extent").is_none());
    }
}
