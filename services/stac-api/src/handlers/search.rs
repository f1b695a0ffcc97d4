//! Cross-collection item search, GET and POST forms.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    Json,
};

use catalog_store::ItemFilter;
use stac_protocol::{ItemCollection, Link, SearchRequest};

use super::items::feature_with_links;
use super::{error_response, geojson_response, query_string_with_token};
use crate::state::AppState;

/// How the `next` link reproduces the original request.
enum NextPage {
    Get(HashMap<String, String>),
    Post(serde_json::Value),
}

/// GET /search
pub async fn search_get_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request = match SearchRequest::from_query_pairs(&params) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    run_search(&state, request, NextPage::Get(params)).await
}

/// POST /search
pub async fn search_post_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<serde_json::Value>>,
) -> Response {
    let body = body.map(|Json(v)| v).unwrap_or_else(|| serde_json::json!({}));

    let request = match SearchRequest::from_body(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    run_search(&state, request, NextPage::Post(body)).await
}

async fn run_search(state: &AppState, request: SearchRequest, next: NextPage) -> Response {
    let items = match state.catalog.find_items(&ItemFilter::from(&request)).await {
        Ok(items) => items,
        Err(e) => return error_response(&e),
    };

    let base_url = state.base_url();
    let search_url = format!("{}/search", base_url);
    let full_page = items.len() == request.limit as usize;

    let features = items
        .iter()
        .map(|item| feature_with_links(item, base_url))
        .collect();

    let mut page = ItemCollection::new(features)
        .with_link(Link::new(&search_url, "self").with_type("application/geo+json"))
        .with_link(Link::new(base_url, "root").with_type("application/json"));

    if full_page {
        page = page.with_link(next_link(&search_url, &next, &request.next_token()));
    }

    geojson_response(StatusCode::OK, &page)
}

fn next_link(search_url: &str, next: &NextPage, token: &str) -> Link {
    match next {
        NextPage::Get(params) => Link::new(
            format!("{}?{}", search_url, query_string_with_token(params, token)),
            "next",
        )
        .with_type("application/geo+json"),
        NextPage::Post(body) => {
            let mut body = body.clone();
            if let Some(map) = body.as_object_mut() {
                map.insert("token".to_string(), token.into());
            }
            Link::new(search_url, "next")
                .with_type("application/geo+json")
                .with_method("POST")
                .with_body(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_link_get_preserves_filters() {
        let params: HashMap<String, String> = [
            ("bbox".to_string(), "126.5,36.7,127.1,37.0".to_string()),
            ("region".to_string(), "Asan".to_string()),
            ("token".to_string(), "0".to_string()),
        ]
        .into_iter()
        .collect();

        let link = next_link("http://localhost:8084/stac/search", &NextPage::Get(params), "100");

        assert_eq!(link.rel, "next");
        assert!(link.href.contains("token=100"));
        assert!(link.href.contains("region=Asan"));
        assert!(!link.href.contains("token=0"));
    }

    #[test]
    fn test_next_link_post_merges_token() {
        let body = serde_json::json!({"collections": ["nas-assets"], "limit": 10});
        let link = next_link("http://localhost:8084/stac/search", &NextPage::Post(body), "10");

        assert_eq!(link.method.as_deref(), Some("POST"));
        let body = link.body.unwrap();
        assert_eq!(body["token"], "10");
        assert_eq!(body["collections"][0], "nas-assets");
    }
}
