//! Landing page handler.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response};

use stac_protocol::LandingPage;

use super::json_response;
use crate::state::AppState;

/// GET / - Landing page (STAC Catalog document)
pub async fn landing_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let base_url = state.base_url();

    let mut landing = LandingPage::new(
        &state.config.catalog_id,
        &state.config.catalog_title,
        &state.config.catalog_description,
        base_url,
    );

    // Child links are best-effort; the landing page stays available when the
    // store is not.
    if let Ok(ids) = state.catalog.list_collection_ids().await {
        for id in ids {
            landing = landing.with_child(base_url, &id);
        }
    }

    json_response(StatusCode::OK, &landing)
}

#[cfg(test)]
mod tests {
    use stac_protocol::LandingPage;

    #[test]
    fn test_landing_page_links() {
        let landing = LandingPage::new(
            "spatial-asset-catalog",
            "Spatial Asset Catalog",
            "STAC API for NAS COG assets.",
            "http://localhost:8084/stac",
        );

        assert!(landing.links.iter().any(|l| l.rel == "self"));
        assert!(landing.links.iter().any(|l| l.rel == "conformance"));
        assert!(landing.links.iter().any(|l| l.rel == "data"));
        assert!(landing
            .links
            .iter()
            .any(|l| l.rel == "search" && l.method.as_deref() == Some("POST")));
    }

    #[test]
    fn test_landing_page_document_type() {
        let landing =
            LandingPage::new("cat", "Catalog", "desc", "http://localhost:8084/stac");
        let json = serde_json::to_value(&landing).unwrap();

        assert_eq!(json["type"], "Catalog");
        assert_eq!(json["stac_version"], "1.0.0");
        assert!(json["conformsTo"].is_array());
    }
}
