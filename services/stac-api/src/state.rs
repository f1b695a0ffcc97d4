//! Application state for the STAC API.

use std::sync::Arc;

use anyhow::Result;

use catalog_store::Catalog;

use crate::config::ApiConfig;

/// Shared application state.
pub struct AppState {
    /// Catalog store for all queries.
    pub catalog: Arc<Catalog>,

    /// Service configuration, including the link base URL.
    pub config: ApiConfig,
}

impl AppState {
    /// Create a new AppState from configuration.
    pub async fn new(config: ApiConfig) -> Result<Self> {
        let catalog = Arc::new(Catalog::connect(&config.database_url).await?);

        Ok(Self { catalog, config })
    }

    /// Base URL for building links.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}
