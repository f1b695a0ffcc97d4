//! Ingestion pipeline: walk the storage root, build items, upsert.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use catalog_store::{Catalog, UpsertOutcome};
use stac_common::{CatalogError, CatalogResult};
use stac_protocol::Collection;

use crate::builder::{build_item, public_href, BuildRequest};
use crate::config::IngesterConfig;
use crate::extract::extract;
use crate::footprint::FootprintProvider;
use crate::scan::{CandidateFile, StorageWalker};

/// Per-file processing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Created,
    Updated,
    SkippedPattern,
    SkippedGeometry,
    DuplicateId,
    Failed,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub scanned: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped_pattern: usize,
    pub skipped_geometry: usize,
    pub duplicate_id: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Created => self.created += 1,
            FileOutcome::Updated => self.updated += 1,
            FileOutcome::SkippedPattern => self.skipped_pattern += 1,
            FileOutcome::SkippedGeometry => self.skipped_geometry += 1,
            FileOutcome::DuplicateId => self.duplicate_id += 1,
            FileOutcome::Failed => self.failed += 1,
        }
    }

    /// Items actually written during the run.
    pub fn committed(&self) -> usize {
        self.created + self.updated
    }
}

/// Main ingestion pipeline.
///
/// One pipeline instance corresponds to one run; overlapping runs against the
/// same root must be serialized externally.
pub struct IngestionPipeline {
    config: IngesterConfig,
    catalog: Catalog,
    footprints: Arc<dyn FootprintProvider>,
    walker: StorageWalker,
}

impl IngestionPipeline {
    /// Create a new ingestion pipeline, connecting to the catalog store and
    /// running migrations.
    pub async fn new(
        config: &IngesterConfig,
        footprints: Arc<dyn FootprintProvider>,
    ) -> CatalogResult<Self> {
        let catalog = Catalog::connect(&config.database_url).await?;
        catalog.migrate().await?;

        let walker = StorageWalker::new(&config.nas_root, &config.derivative_root);

        Ok(Self {
            config: config.clone(),
            catalog,
            footprints,
            walker,
        })
    }

    /// Run one ingestion cycle over the storage root.
    ///
    /// File-level failures are logged and counted, never fatal. A store
    /// failure aborts the run; counts committed before the abort are logged
    /// alongside the error. With `dry_run`, nothing is written.
    pub async fn run(&self, dry_run: bool) -> CatalogResult<RunSummary> {
        let run_id = Uuid::new_v4();
        info!(%run_id, root = %self.config.nas_root.display(), dry_run, "Starting ingestion run");

        if !dry_run {
            self.ensure_collection().await?;
        }

        let candidates = self.walker.candidates();
        let mut summary = RunSummary {
            scanned: candidates.len(),
            ..Default::default()
        };
        let mut touched: HashSet<String> = HashSet::new();

        // Extraction and build work is independent per file; only the upsert
        // inside process_file serializes on the store's own transaction.
        let mut results = stream::iter(
            candidates
                .into_iter()
                .map(|candidate| self.process_file(candidate, dry_run)),
        )
        .buffer_unordered(self.config.parallel_workers);

        while let Some(result) = results.next().await {
            match result {
                Ok(outcome) => {
                    summary.record(outcome);
                    if matches!(outcome, FileOutcome::Created | FileOutcome::Updated) {
                        touched.insert(self.config.collection_id.clone());
                    }
                }
                Err(e) => {
                    error!(
                        %run_id,
                        error = %e,
                        committed = summary.committed(),
                        scanned = summary.scanned,
                        "Store failure aborted the run"
                    );
                    return Err(e);
                }
            }
        }

        if !dry_run {
            for collection_id in &touched {
                self.catalog.recompute_extent(collection_id).await?;
            }
        }

        info!(
            %run_id,
            scanned = summary.scanned,
            created = summary.created,
            updated = summary.updated,
            skipped_pattern = summary.skipped_pattern,
            skipped_geometry = summary.skipped_geometry,
            duplicate_id = summary.duplicate_id,
            failed = summary.failed,
            "Ingestion run completed"
        );

        Ok(summary)
    }

    /// Delete a collection and its items. Explicit maintenance only.
    pub async fn delete_collection(&self, id: &str) -> CatalogResult<u64> {
        self.catalog.delete_collection(id).await
    }

    /// Make sure the target collection exists before items reference it.
    async fn ensure_collection(&self) -> CatalogResult<()> {
        let collection = Collection::new(&self.config.collection_id)
            .with_title(&self.config.collection_title)
            .with_description(&self.config.collection_description)
            .with_source_root(self.config.nas_root.display().to_string());

        self.catalog.upsert_collection(&collection).await
    }

    /// Process one file: extract, resolve footprint, build, upsert.
    ///
    /// The returned `Err` is reserved for store failures; everything
    /// file-local maps to a counted outcome.
    #[instrument(skip(self, candidate), fields(path = %candidate.rel_path))]
    async fn process_file(
        &self,
        candidate: CandidateFile,
        dry_run: bool,
    ) -> CatalogResult<FileOutcome> {
        let source_path = candidate.path.display().to_string();

        let metadata = match extract(&source_path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(error = %e, "Skipping file with non-conforming name");
                return Ok(FileOutcome::SkippedPattern);
            }
        };

        let footprint = match self.footprints.footprint(&candidate.path).await {
            Ok(Some(bbox)) => bbox,
            Ok(None) => {
                warn!("Skipping file without a WGS84 footprint");
                return Ok(FileOutcome::SkippedGeometry);
            }
            Err(CatalogError::InvalidGeometry(msg)) => {
                warn!(error = %msg, "Skipping file with unusable geometry");
                return Ok(FileOutcome::SkippedGeometry);
            }
            Err(e) => {
                warn!(error = %e, "Skipping unreadable file");
                return Ok(FileOutcome::Failed);
            }
        };

        let thumbnail_href = self.walker.thumbnail_exists(&candidate.rel_path).then(|| {
            let thumb_rel = format!(
                "result/thumb/{}",
                replace_extension(&candidate.rel_path, "jpg")
            );
            public_href(&self.config.public_url_base, &thumb_rel)
        });

        let item = match build_item(&BuildRequest {
            source_path: &source_path,
            rel_path: &candidate.rel_path,
            metadata: &metadata,
            footprint,
            file_size: candidate.size,
            thumbnail_href,
            collection_id: &self.config.collection_id,
            public_url_base: &self.config.public_url_base,
        }) {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "Skipping file that failed to build");
                return Ok(FileOutcome::Failed);
            }
        };

        if dry_run {
            info!(id = %item.id, "Would upsert item");
            return Ok(FileOutcome::Created);
        }

        match self.catalog.upsert_item(&item).await {
            Ok(UpsertOutcome::Created) => {
                info!(id = %item.id, "Created item");
                Ok(FileOutcome::Created)
            }
            Ok(UpsertOutcome::Updated) => {
                info!(id = %item.id, "Updated item");
                Ok(FileOutcome::Updated)
            }
            Err(CatalogError::DuplicateIdentity { id, collection_id }) => {
                warn!(
                    id = %id,
                    collection = %collection_id,
                    "Item id already taken by a different source path; existing item left untouched"
                );
                Ok(FileOutcome::DuplicateId)
            }
            Err(e) => Err(e),
        }
    }
}

fn replace_extension(rel_path: &str, ext: &str) -> String {
    match rel_path.rsplit_once('.') {
        Some((stem, _)) => format!("{}.{}", stem, ext),
        None => format!("{}.{}", rel_path, ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(FileOutcome::Created);
        summary.record(FileOutcome::Created);
        summary.record(FileOutcome::Updated);
        summary.record(FileOutcome::SkippedPattern);
        summary.record(FileOutcome::DuplicateId);

        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped_pattern, 1);
        assert_eq!(summary.duplicate_id, 1);
        assert_eq!(summary.committed(), 3);
    }

    #[test]
    fn test_replace_extension() {
        assert_eq!(
            replace_extension("2023/2023_Asan_B_cog.tif", "jpg"),
            "2023/2023_Asan_B_cog.jpg"
        );
        assert_eq!(replace_extension("noext", "jpg"), "noext.jpg");
    }
}
