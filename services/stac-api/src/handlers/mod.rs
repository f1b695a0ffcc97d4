//! HTTP request handlers for the STAC API.

pub mod collections;
pub mod conformance;
pub mod health;
pub mod items;
pub mod landing;
pub mod search;

use axum::{
    http::{header, StatusCode},
    response::Response,
};
use serde::Serialize;

use stac_common::CatalogError;
use stac_protocol::ExceptionResponse;

/// Serialize a body into a JSON response.
pub(crate) fn json_response(status: StatusCode, body: &impl Serialize) -> Response {
    let json = serde_json::to_string_pretty(body).unwrap_or_default();

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(json.into())
        .unwrap()
}

/// As [`json_response`], with the GeoJSON media type.
pub(crate) fn geojson_response(status: StatusCode, body: &impl Serialize) -> Response {
    let json = serde_json::to_string_pretty(body).unwrap_or_default();

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/geo+json")
        .body(json.into())
        .unwrap()
}

/// Map a catalog error onto a structured exception response. Store failures
/// deliberately surface as a generic server error.
pub(crate) fn error_response(error: &CatalogError) -> Response {
    let exception = match error {
        CatalogError::QueryRejected(msg) => ExceptionResponse::bad_request(msg.clone()),
        CatalogError::NotFound(msg) => ExceptionResponse::not_found(msg.clone()),
        CatalogError::StoreUnavailable(_) => {
            tracing::error!(error = %error, "Store failure during request");
            ExceptionResponse::internal_error("catalog store error")
        }
        _ => {
            tracing::error!(error = %error, "Unexpected failure during request");
            ExceptionResponse::internal_error("internal error")
        }
    };

    let status =
        StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, &exception)
}

/// Percent-encode a query-string component (RFC 3986 unreserved set kept).
pub(crate) fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Rebuild a query string with the pagination token replaced.
pub(crate) fn query_string_with_token(
    pairs: &std::collections::HashMap<String, String>,
    token: &str,
) -> String {
    let mut parts: Vec<String> = pairs
        .iter()
        .filter(|(key, _)| key.as_str() != "token")
        .map(|(key, value)| format!("{}={}", urlencode(key), urlencode(value)))
        .collect();
    parts.sort();
    parts.push(format!("token={}", urlencode(token)));
    parts.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("Asan"), "Asan");
        assert_eq!(urlencode("126.5,36.7"), "126.5%2C36.7");
        assert_eq!(urlencode("2023-01-01T00:00:00Z/.."), "2023-01-01T00%3A00%3A00Z%2F..");
    }

    #[test]
    fn test_query_string_with_token() {
        let pairs: HashMap<String, String> = [
            ("bbox".to_string(), "1,2,3,4".to_string()),
            ("token".to_string(), "100".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            query_string_with_token(&pairs, "200"),
            "bbox=1%2C2%2C3%2C4&token=200"
        );
    }

    #[test]
    fn test_error_response_mapping() {
        let response = error_response(&CatalogError::QueryRejected("bad bbox".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(&CatalogError::NotFound("collection".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = error_response(&CatalogError::StoreUnavailable("pool".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
