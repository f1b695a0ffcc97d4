//! Collections endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
};
use serde::Serialize;

use stac_protocol::{Collection, Link};

use super::{error_response, json_response};
use crate::state::AppState;

/// Wire shape of the collections listing.
#[derive(Serialize)]
struct CollectionList {
    collections: Vec<Collection>,
    links: Vec<Link>,
}

/// GET /collections - List all collections
pub async fn list_collections_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let base_url = state.base_url();

    let mut collections = match state.catalog.list_collections().await {
        Ok(collections) => collections,
        Err(e) => return error_response(&e),
    };

    for collection in &mut collections {
        collection.build_links(base_url);
    }

    let list = CollectionList {
        collections,
        links: vec![
            Link::new(format!("{}/collections", base_url), "self")
                .with_type("application/json"),
            Link::new(base_url, "root").with_type("application/json"),
        ],
    };

    json_response(StatusCode::OK, &list)
}

/// GET /collections/:collection_id - Get a specific collection
pub async fn get_collection_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(collection_id): Path<String>,
) -> Response {
    match state.catalog.get_collection(&collection_id).await {
        Ok(mut collection) => {
            collection.build_links(state.base_url());
            json_response(StatusCode::OK, &collection)
        }
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_list_shape() {
        let mut collection = Collection::new("nas-assets").with_title("NAS Assets");
        collection.build_links("http://localhost:8084/stac");

        let list = CollectionList {
            collections: vec![collection],
            links: vec![Link::new("http://localhost:8084/stac/collections", "self")],
        };

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["collections"][0]["id"], "nas-assets");
        assert!(json["collections"][0]["links"]
            .as_array()
            .unwrap()
            .iter()
            .any(|l| l["rel"] == "items"));
        assert_eq!(json["links"][0]["rel"], "self");
    }
}
