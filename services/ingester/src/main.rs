//! Spatial asset ingester service.
//!
//! Walks a NAS storage root, derives STAC metadata from asset filenames and
//! georeferencing tags, and upserts items into the catalog store.

mod builder;
mod config;
mod extract;
mod footprint;
mod ingest;
mod scan;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::IngesterConfig;
use footprint::FileFootprints;
use ingest::IngestionPipeline;

#[derive(Parser, Debug)]
#[command(name = "ingester")]
#[command(about = "Spatial asset ingester for the STAC catalog")]
struct Args {
    /// Storage root to scan (overrides NAS_DATA_ROOT)
    #[arg(short, long)]
    root: Option<String>,

    /// Collection receiving ingested items (overrides COLLECTION_ID)
    #[arg(short, long)]
    collection: Option<String>,

    /// Scan and report without writing to the store
    #[arg(long)]
    dry_run: bool,

    /// Delete a collection and its items, then exit (maintenance)
    #[arg(long, value_name = "ID")]
    delete_collection: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting spatial asset ingester");

    let mut config = IngesterConfig::from_env()?;
    if let Some(root) = args.root {
        config.nas_root = root.into();
        config.derivative_root = config.nas_root.join("result");
    }
    if let Some(collection) = args.collection {
        config.collection_id = collection;
    }

    info!(
        root = %config.nas_root.display(),
        collection = %config.collection_id,
        "Loaded configuration"
    );

    let pipeline = IngestionPipeline::new(&config, Arc::new(FileFootprints)).await?;

    if let Some(collection_id) = &args.delete_collection {
        let deleted = pipeline.delete_collection(collection_id).await?;
        info!(collection = %collection_id, deleted, "Deleted collection");
        return Ok(());
    }

    let summary = pipeline.run(args.dry_run).await?;

    info!(
        scanned = summary.scanned,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped_pattern + summary.skipped_geometry,
        failed = summary.failed,
        "Done"
    );

    Ok(())
}
