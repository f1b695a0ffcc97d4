//! STAC Item construction from extracted metadata and footprints.

use std::collections::BTreeMap;

use stac_common::{year_interval, BoundingBox, CatalogError, CatalogResult};
use stac_protocol::{Asset, Geometry, Item, ItemTemporal, PropertyValue};

use crate::extract::PathMetadata;

/// Everything needed to assemble one Item.
pub struct BuildRequest<'a> {
    /// Canonical source location; the ingestion idempotency key.
    pub source_path: &'a str,

    /// Path relative to the storage root, forward-slash separated.
    pub rel_path: &'a str,

    pub metadata: &'a PathMetadata,

    /// WGS84 footprint bounds resolved for the source asset.
    pub footprint: BoundingBox,

    /// File size in bytes.
    pub file_size: u64,

    /// Public URL of a confirmed thumbnail derivative, when one exists.
    pub thumbnail_href: Option<String>,

    pub collection_id: &'a str,

    /// Public URL substituted for the storage root prefix.
    pub public_url_base: &'a str,
}

/// Build a fully populated Item.
///
/// The item id is the filename without extension. A year is the only
/// temporal knowledge a filename carries, so `datetime` stays null and the
/// year's UTC bounding interval goes into `start_datetime`/`end_datetime`.
pub fn build_item(request: &BuildRequest<'_>) -> CatalogResult<Item> {
    let filename = request
        .rel_path
        .rsplit('/')
        .next()
        .unwrap_or(request.rel_path);
    let id = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename)
        .to_string();
    if id.is_empty() {
        return Err(CatalogError::PatternMismatch(filename.to_string()));
    }

    let mut properties: BTreeMap<String, PropertyValue> = BTreeMap::new();
    properties.insert("year".to_string(), PropertyValue::from(request.metadata.year));
    properties.insert(
        "region".to_string(),
        PropertyValue::from(request.metadata.region.as_str()),
    );
    properties.insert(
        "zone".to_string(),
        PropertyValue::from(request.metadata.zone.as_str()),
    );
    properties.insert(
        "file:size".to_string(),
        PropertyValue::Number(request.file_size as f64),
    );

    let mut assets: BTreeMap<String, Asset> = BTreeMap::new();
    assets.insert(
        "data".to_string(),
        Asset::new(public_href(request.public_url_base, request.rel_path))
            .with_type(media_type(request.rel_path))
            .with_role("data"),
    );
    if let Some(href) = &request.thumbnail_href {
        assets.insert(
            "thumbnail".to_string(),
            Asset::new(href.clone())
                .with_type("image/jpeg")
                .with_role("thumbnail"),
        );
    }

    let (start, end) = year_interval(request.metadata.year);

    let item = Item {
        id,
        collection_id: request.collection_id.to_string(),
        geometry: Geometry::from_bbox(&request.footprint),
        bbox: Some(request.footprint.to_vec()),
        temporal: ItemTemporal::Interval { start, end },
        properties,
        assets,
        source_path: request.source_path.to_string(),
        links: Vec::new(),
    };

    item.validate()?;
    Ok(item)
}

/// Public URL for a storage-relative path.
pub fn public_href(base: &str, rel_path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), rel_path)
}

/// Media type detected from the file extension.
pub fn media_type(path: &str) -> &'static str {
    let ext = path
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "tif" | "tiff" => "image/tiff; application=geotiff",
        "shp" => "application/vnd.shp",
        "geojson" => "application/geo+json",
        "gpkg" => "application/geopackage+sqlite3",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use chrono::{TimeZone, Utc};

    fn request<'a>(
        metadata: &'a PathMetadata,
        thumbnail: Option<String>,
    ) -> BuildRequest<'a> {
        BuildRequest {
            source_path: "/nas/2023/2023_Asan_B_cog.tif",
            rel_path: "2023/2023_Asan_B_cog.tif",
            metadata,
            footprint: BoundingBox::new(126.5, 36.95, 126.6, 37.0),
            file_size: 52_428_800,
            thumbnail_href: thumbnail,
            collection_id: "nas-assets",
            public_url_base: "https://assets.example.com/",
        }
    }

    #[test]
    fn test_extractor_output_round_trips_into_properties() {
        let metadata = extract("/nas/2023/2023_Asan_B_cog.tif").unwrap();
        let item = build_item(&request(&metadata, None)).unwrap();

        assert_eq!(item.id, "2023_Asan_B_cog");
        assert_eq!(item.properties["year"].as_number(), Some(2023.0));
        assert_eq!(item.properties["region"].as_str(), Some("Asan"));
        assert_eq!(item.properties["zone"].as_str(), Some("B"));
        assert_eq!(
            item.properties["file:size"].as_number(),
            Some(52_428_800.0)
        );
    }

    #[test]
    fn test_year_bounding_interval_policy() {
        let metadata = extract("2023_Asan_B_cog.tif").unwrap();
        let item = build_item(&request(&metadata, None)).unwrap();

        assert_eq!(
            item.temporal,
            ItemTemporal::Interval {
                start: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap(),
            }
        );
    }

    #[test]
    fn test_data_asset_href_substitution() {
        let metadata = extract("2023_Asan_B_cog.tif").unwrap();
        let item = build_item(&request(&metadata, None)).unwrap();

        let data = &item.assets["data"];
        assert_eq!(
            data.href,
            "https://assets.example.com/2023/2023_Asan_B_cog.tif"
        );
        assert_eq!(data.type_.as_deref(), Some("image/tiff; application=geotiff"));
        assert!(!item.assets.contains_key("thumbnail"));
    }

    #[test]
    fn test_thumbnail_only_when_confirmed() {
        let metadata = extract("2023_Asan_B_cog.tif").unwrap();
        let href = "https://assets.example.com/result/thumb/2023/2023_Asan_B_cog.jpg";
        let item = build_item(&request(&metadata, Some(href.to_string()))).unwrap();

        let thumb = &item.assets["thumbnail"];
        assert_eq!(thumb.href, href);
        assert_eq!(thumb.type_.as_deref(), Some("image/jpeg"));
        assert_eq!(thumb.roles, vec!["thumbnail"]);
    }

    #[test]
    fn test_geometry_matches_footprint() {
        let metadata = extract("2023_Asan_B_cog.tif").unwrap();
        let item = build_item(&request(&metadata, None)).unwrap();

        assert_eq!(item.bbox, Some(vec![126.5, 36.95, 126.6, 37.0]));
        assert_eq!(
            item.geometry.bbox(),
            Some(BoundingBox::new(126.5, 36.95, 126.6, 37.0))
        );
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_media_types() {
        assert_eq!(media_type("a/b_cog.TIF"), "image/tiff; application=geotiff");
        assert_eq!(media_type("a/b_cog.geojson"), "application/geo+json");
        assert_eq!(media_type("a/b_cog.gpkg"), "application/geopackage+sqlite3");
        assert_eq!(media_type("a/b_cog.bin"), "application/octet-stream");
    }
}
