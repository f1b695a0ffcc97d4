//! Conformance endpoint handler.

use axum::{http::StatusCode, response::Response};

use stac_protocol::ConformanceClasses;

use super::json_response;

/// GET /conformance - Conformance classes
pub async fn conformance_handler() -> Response {
    json_response(StatusCode::OK, &ConformanceClasses::current())
}

#[cfg(test)]
mod tests {
    use stac_protocol::{conformance, ConformanceClasses};

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
            .any(|v| v.as_str().unwrap().contains("item-search")));
    }
}
