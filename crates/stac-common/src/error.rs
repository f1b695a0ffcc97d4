//! Error types for the spatial-asset-catalog services.

use thiserror::Error;

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Primary error type for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    // === Ingestion errors (recoverable per file) ===
    #[error("Filename does not match naming convention: {0}")]
    PatternMismatch(String),

    #[error("Item id '{id}' in collection '{collection_id}' is already taken by a different source path")]
    DuplicateIdentity { id: String, collection_id: String },

    #[error("Invalid or missing footprint geometry: {0}")]
    InvalidGeometry(String),

    // === Store errors (fatal to an ingestion run) ===
    #[error("Catalog store unavailable: {0}")]
    StoreUnavailable(String),

    // === Query errors (per request) ===
    #[error("Malformed query: {0}")]
    QueryRejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CatalogError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            CatalogError::QueryRejected(_)
            | CatalogError::PatternMismatch(_)
            | CatalogError::InvalidGeometry(_) => 400,

            CatalogError::NotFound(_) => 404,

            CatalogError::DuplicateIdentity { .. } => 409,

            CatalogError::StoreUnavailable(_) | CatalogError::InternalError(_) => 500,
        }
    }

    /// True when an ingestion run should continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CatalogError::PatternMismatch(_)
                | CatalogError::DuplicateIdentity { .. }
                | CatalogError::InvalidGeometry(_)
        )
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::InternalError(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CatalogError::QueryRejected("bad bbox".into()).http_status_code(),
            400
        );
        assert_eq!(
            CatalogError::NotFound("collection x".into()).http_status_code(),
            404
        );
        assert_eq!(
            CatalogError::StoreUnavailable("pool timeout".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(CatalogError::PatternMismatch("x.tif".into()).is_recoverable());
        assert!(CatalogError::DuplicateIdentity {
            id: "a".into(),
            collection_id: "c".into()
        }
        .is_recoverable());
        assert!(!CatalogError::StoreUnavailable("down".into()).is_recoverable());
    }
}
