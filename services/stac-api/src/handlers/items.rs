//! Per-collection item listing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
};

use catalog_store::ItemFilter;
use stac_protocol::{Item, ItemCollection, Link, SearchRequest};

use super::{error_response, geojson_response, query_string_with_token};
use crate::state::AppState;

/// A feature with collection/root navigation links attached.
pub(crate) fn feature_with_links(item: &Item, base_url: &str) -> serde_json::Value {
    let mut feature = item.to_feature();
    feature["links"] = serde_json::json!([
        {
            "rel": "collection",
            "href": format!("{}/collections/{}", base_url, item.collection_id),
            "type": "application/json"
        },
        {
            "rel": "root",
            "href": base_url,
            "type": "application/json"
        }
    ]);
    feature
}

/// GET /collections/:collection_id/items - Paginated item listing scoped to
/// one collection. Unreserved query parameters filter on properties.
pub async fn list_items_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(collection_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // Unknown collections are a 404, not an empty listing.
    if let Err(e) = state.catalog.get_collection(&collection_id).await {
        return error_response(&e);
    }

    let mut request = match SearchRequest::from_query_pairs(&params) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };
    request.collections = vec![collection_id.clone()];

    let items = match state.catalog.find_items(&ItemFilter::from(&request)).await {
        Ok(items) => items,
        Err(e) => return error_response(&e),
    };

    let base_url = state.base_url();
    let items_url = format!("{}/collections/{}/items", base_url, collection_id);
    let full_page = items.len() == request.limit as usize;

    let features = items
        .iter()
        .map(|item| feature_with_links(item, base_url))
        .collect();

    let mut page = ItemCollection::new(features)
        .with_link(Link::new(&items_url, "self").with_type("application/geo+json"))
        .with_link(Link::new(base_url, "root").with_type("application/json"))
        .with_link(
            Link::new(format!("{}/collections/{}", base_url, collection_id), "collection")
                .with_type("application/json"),
        );

    if full_page {
        let query = query_string_with_token(&params, &request.next_token());
        page = page.with_link(
            Link::new(format!("{}?{}", items_url, query), "next")
                .with_type("application/geo+json"),
        );
    }

    geojson_response(StatusCode::OK, &page)
}
