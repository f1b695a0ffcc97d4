//! STAC API Server
//!
//! SpatioTemporal Asset Catalog search API over the spatial asset store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use clap::Parser;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use stac_api::config::ApiConfig;
use stac_api::handlers;
use stac_api::state::AppState;

/// STAC API Server
#[derive(Parser, Debug)]
#[command(name = "stac-api")]
#[command(about = "STAC API server for the spatial asset catalog")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8084", env = "STAC_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "STAC_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .expect("Failed to create Tokio runtime");

    runtime.block_on(async move {
        run_server(args).await;
    });
}

async fn run_server(args: Args) {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!("Starting STAC API server");

    let config = ApiConfig::from_env();
    let base_path = config.base_path.clone();

    // Initialize application state
    let state = match AppState::new(config).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("Failed to initialize application state: {}", e);
            std::process::exit(1);
        }
    };

    let stac_routes = Router::new()
        // Landing page
        .route("/", get(handlers::landing::landing_handler))
        // Conformance
        .route("/conformance", get(handlers::conformance::conformance_handler))
        // Collections
        .route(
            "/collections",
            get(handlers::collections::list_collections_handler),
        )
        .route(
            "/collections/:collection_id",
            get(handlers::collections::get_collection_handler),
        )
        .route(
            "/collections/:collection_id/items",
            get(handlers::items::list_items_handler),
        )
        // Search
        .route(
            "/search",
            get(handlers::search::search_get_handler).post(handlers::search::search_post_handler),
        );

    // Mount under the configured prefix; an empty prefix serves at the root
    let app = if base_path.is_empty() {
        Router::new().merge(stac_routes)
    } else {
        Router::new().nest(&base_path, stac_routes)
    };

    let app = app
        // Health
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    // Parse listen address
    let addr: SocketAddr = args.listen.parse().expect("Invalid listen address");

    info!("STAC API listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server failed");
}
