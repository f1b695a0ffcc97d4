//! Metadata catalog using PostgreSQL/PostGIS.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::debug;

use stac_common::{BoundingBox, CatalogError, CatalogResult};
use stac_protocol::{Collection, Extent, Geometry, Item, ItemTemporal};

use crate::filter::{build_find_query, ItemFilter};

/// Result of an item upsert: whether the source path was first seen or
/// refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Database connection pool and catalog operations.
pub struct Catalog {
    pool: PgPool,
}

impl Catalog {
    /// Create a new catalog connection from a database URL. Pool acquisition
    /// is bounded so no store call blocks indefinitely.
    pub async fn connect(database_url: &str) -> CatalogResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| CatalogError::StoreUnavailable(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> CatalogResult<()> {
        // Split SQL statements and execute them individually
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        CatalogError::StoreUnavailable(format!("Migration failed: {}", e))
                    })?;
            }
        }

        Ok(())
    }

    /// Insert or update a collection by id. Extent is written as supplied;
    /// use [`Catalog::recompute_extent`] after membership changes.
    pub async fn upsert_collection(&self, collection: &Collection) -> CatalogResult<()> {
        sqlx::query(
            r#"
            INSERT INTO collections (
                id, title, description, stac_version, stac_extensions,
                license, keywords, providers, extent, links, source_root
            ) VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10, $11
            )
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                stac_version = EXCLUDED.stac_version,
                stac_extensions = EXCLUDED.stac_extensions,
                license = EXCLUDED.license,
                keywords = EXCLUDED.keywords,
                providers = EXCLUDED.providers,
                links = EXCLUDED.links,
                source_root = EXCLUDED.source_root,
                updated_at = NOW()
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.title)
        .bind(&collection.description)
        .bind(&collection.stac_version)
        .bind(&collection.stac_extensions)
        .bind(&collection.license)
        .bind(&collection.keywords)
        .bind(serde_json::to_value(&collection.providers)?)
        .bind(
            collection
                .extent
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(serde_json::to_value(&collection.links)?)
        .bind(&collection.source_root)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    /// Insert or update an item, keyed by `source_path`.
    ///
    /// Atomic: the duplicate-identity check and the write happen in one
    /// transaction. A `(collection_id, id)` pair already owned by a different
    /// `source_path` is rejected with `DuplicateIdentity` and the existing
    /// row is left untouched.
    pub async fn upsert_item(&self, item: &Item) -> CatalogResult<UpsertOutcome> {
        item.validate()?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let owner_path: Option<String> = sqlx::query_scalar(
            "SELECT source_path FROM items WHERE collection_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(&item.collection_id)
        .bind(&item.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?;

        if let Some(path) = owner_path {
            if path != item.source_path {
                return Err(CatalogError::DuplicateIdentity {
                    id: item.id.clone(),
                    collection_id: item.collection_id.clone(),
                });
            }
        }

        let existing: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM items WHERE source_path = $1")
                .bind(&item.source_path)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err)?;

        let (datetime, start_datetime, end_datetime) = match &item.temporal {
            ItemTemporal::Instant(t) => (Some(*t), None, None),
            ItemTemporal::Interval { start, end } => (None, Some(*start), Some(*end)),
        };

        sqlx::query(
            r#"
            INSERT INTO items (
                id, collection_id, geom, bbox,
                datetime, start_datetime, end_datetime,
                properties, assets, links, source_path
            ) VALUES (
                $1, $2, ST_SetSRID(ST_GeomFromGeoJSON($3), 4326), $4,
                $5, $6, $7,
                $8, $9, $10, $11
            )
            ON CONFLICT (source_path) DO UPDATE SET
                id = EXCLUDED.id,
                collection_id = EXCLUDED.collection_id,
                geom = EXCLUDED.geom,
                bbox = EXCLUDED.bbox,
                datetime = EXCLUDED.datetime,
                start_datetime = EXCLUDED.start_datetime,
                end_datetime = EXCLUDED.end_datetime,
                properties = EXCLUDED.properties,
                assets = EXCLUDED.assets,
                links = EXCLUDED.links,
                updated_at = NOW()
            "#,
        )
        .bind(&item.id)
        .bind(&item.collection_id)
        .bind(serde_json::to_string(&item.geometry)?)
        .bind(&item.bbox)
        .bind(datetime)
        .bind(start_datetime)
        .bind(end_datetime)
        .bind(serde_json::to_value(&item.properties)?)
        .bind(serde_json::to_value(&item.assets)?)
        .bind(serde_json::to_value(&item.links)?)
        .bind(&item.source_path)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        Ok(if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    /// Find items matching filter criteria, ordered deterministically.
    pub async fn find_items(&self, filter: &ItemFilter) -> CatalogResult<Vec<Item>> {
        debug!(?filter, "Running item query");

        let mut query = build_find_query(filter);
        let rows: Vec<ItemRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        rows.into_iter().map(Item::try_from).collect()
    }

    /// Fetch a collection by id, deriving the extent from member items when
    /// none has been persisted yet.
    pub async fn get_collection(&self, id: &str) -> CatalogResult<Collection> {
        let row: Option<CollectionRow> = sqlx::query_as(
            "SELECT id, title, description, stac_version, stac_extensions, license, \
             keywords, providers, extent, links, source_root \
             FROM collections WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        let row = row.ok_or_else(|| CatalogError::NotFound(format!("Collection: {}", id)))?;
        let mut collection = Collection::try_from(row)?;

        if collection.extent.is_none() {
            collection.extent = Some(self.compute_extent(id).await?);
        }

        Ok(collection)
    }

    /// List all collections, with lazily derived extents.
    pub async fn list_collections(&self) -> CatalogResult<Vec<Collection>> {
        let rows: Vec<CollectionRow> = sqlx::query_as(
            "SELECT id, title, description, stac_version, stac_extensions, license, \
             keywords, providers, extent, links, source_root \
             FROM collections ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut collections = Vec::with_capacity(rows.len());
        for row in rows {
            let mut collection = Collection::try_from(row)?;
            if collection.extent.is_none() {
                collection.extent = Some(self.compute_extent(&collection.id).await?);
            }
            collections.push(collection);
        }

        Ok(collections)
    }

    /// List collection ids only (landing page child links).
    pub async fn list_collection_ids(&self) -> CatalogResult<Vec<String>> {
        sqlx::query_scalar("SELECT id FROM collections ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)
    }

    /// Recompute and persist a collection's extent from its current members.
    pub async fn recompute_extent(&self, id: &str) -> CatalogResult<Extent> {
        let extent = self.compute_extent(id).await?;

        sqlx::query("UPDATE collections SET extent = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(serde_json::to_value(&extent)?)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(extent)
    }

    /// Delete a collection and, via the FK cascade, its member items.
    /// An explicit maintenance operation, never invoked by ingestion.
    pub async fn delete_collection(&self, id: &str) -> CatalogResult<u64> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected())
    }

    /// Cheap connectivity probe for readiness checks.
    pub async fn ping(&self) -> CatalogResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    /// Union of member geometry envelopes and datetime bounds.
    async fn compute_extent(&self, collection_id: &str) -> CatalogResult<Extent> {
        let row: (
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<DateTime<Utc>>,
            Option<DateTime<Utc>>,
        ) = sqlx::query_as(
            "SELECT ST_XMin(ST_Extent(geom)), ST_YMin(ST_Extent(geom)), \
             ST_XMax(ST_Extent(geom)), ST_YMax(ST_Extent(geom)), \
             MIN(COALESCE(start_datetime, datetime)), \
             MAX(COALESCE(end_datetime, datetime)) \
             FROM items WHERE collection_id = $1",
        )
        .bind(collection_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        let bbox = match row {
            (Some(min_x), Some(min_y), Some(max_x), Some(max_y), _, _) => {
                Some(BoundingBox::new(min_x, min_y, max_x, max_y))
            }
            _ => None,
        };

        Ok(Extent::new(
            bbox,
            row.4.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            row.5.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ))
    }
}

fn store_err(e: sqlx::Error) -> CatalogError {
    CatalogError::StoreUnavailable(e.to_string())
}

/// Internal row type for item queries.
#[derive(FromRow)]
struct ItemRow {
    id: String,
    collection_id: String,
    geometry: String,
    bbox: Option<Vec<f64>>,
    datetime: Option<DateTime<Utc>>,
    start_datetime: Option<DateTime<Utc>>,
    end_datetime: Option<DateTime<Utc>>,
    properties: serde_json::Value,
    assets: serde_json::Value,
    links: serde_json::Value,
    source_path: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = CatalogError;

    fn try_from(row: ItemRow) -> CatalogResult<Item> {
        let geometry: Geometry = serde_json::from_str(&row.geometry)?;

        let temporal = match (row.datetime, row.start_datetime, row.end_datetime) {
            (Some(t), _, _) => ItemTemporal::Instant(t),
            (None, Some(start), Some(end)) => ItemTemporal::Interval { start, end },
            _ => {
                return Err(CatalogError::InternalError(format!(
                    "item '{}' violates the temporal exclusivity constraint",
                    row.id
                )))
            }
        };

        Ok(Item {
            id: row.id,
            collection_id: row.collection_id,
            geometry,
            bbox: row.bbox,
            temporal,
            properties: serde_json::from_value(row.properties)?,
            assets: serde_json::from_value(row.assets)?,
            links: serde_json::from_value(row.links)?,
            source_path: row.source_path,
        })
    }
}

/// Internal row type for collection queries.
#[derive(FromRow)]
struct CollectionRow {
    id: String,
    title: Option<String>,
    description: String,
    stac_version: String,
    stac_extensions: Vec<String>,
    license: String,
    keywords: Vec<String>,
    providers: serde_json::Value,
    extent: Option<serde_json::Value>,
    links: serde_json::Value,
    source_root: Option<String>,
}

impl TryFrom<CollectionRow> for Collection {
    type Error = CatalogError;

    fn try_from(row: CollectionRow) -> CatalogResult<Collection> {
        Ok(Collection {
            type_: "Collection".to_string(),
            stac_version: row.stac_version,
            stac_extensions: row.stac_extensions,
            id: row.id,
            title: row.title,
            description: row.description,
            license: row.license,
            keywords: row.keywords,
            providers: serde_json::from_value(row.providers)?,
            extent: row.extent.map(serde_json::from_value).transpose()?,
            links: serde_json::from_value(row.links)?,
            source_root: row.source_root,
        })
    }
}

/// Database schema SQL.
const SCHEMA_SQL: &str = r#"
CREATE EXTENSION IF NOT EXISTS postgis;

CREATE TABLE IF NOT EXISTS collections (
    id TEXT PRIMARY KEY,
    title TEXT,
    description TEXT NOT NULL DEFAULT '',
    stac_version VARCHAR(20) NOT NULL DEFAULT '1.0.0',
    stac_extensions TEXT[] NOT NULL DEFAULT '{}',
    license TEXT NOT NULL DEFAULT 'proprietary',
    keywords TEXT[] NOT NULL DEFAULT '{}',
    providers JSONB NOT NULL DEFAULT '[]',
    extent JSONB,
    links JSONB NOT NULL DEFAULT '[]',
    source_root TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS items (
    id TEXT NOT NULL,
    collection_id TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    geom geometry(Geometry, 4326) NOT NULL,
    bbox DOUBLE PRECISION[],
    datetime TIMESTAMPTZ,
    start_datetime TIMESTAMPTZ,
    end_datetime TIMESTAMPTZ,
    properties JSONB NOT NULL DEFAULT '{}',
    assets JSONB NOT NULL DEFAULT '{}',
    links JSONB NOT NULL DEFAULT '[]',
    source_path TEXT NOT NULL UNIQUE,
    ingested_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    PRIMARY KEY (collection_id, id),
    CONSTRAINT items_bbox_arity CHECK (
        bbox IS NULL OR cardinality(bbox) IN (4, 6)
    ),
    CONSTRAINT items_temporal_exclusive CHECK (
        (datetime IS NOT NULL AND start_datetime IS NULL AND end_datetime IS NULL)
        OR (datetime IS NULL AND start_datetime IS NOT NULL AND end_datetime IS NOT NULL)
    )
);

CREATE INDEX IF NOT EXISTS idx_items_geom ON items USING GIST (geom);
CREATE INDEX IF NOT EXISTS idx_items_datetime ON items(datetime);
CREATE INDEX IF NOT EXISTS idx_items_interval ON items(start_datetime, end_datetime);
CREATE INDEX IF NOT EXISTS idx_items_properties ON items USING GIN (properties)
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_split_cleanly() {
        let statements: Vec<&str> = SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        assert!(statements.len() >= 6);
        assert!(statements[0].contains("postgis"));
        assert!(statements.iter().any(|s| s.contains("source_path TEXT NOT NULL UNIQUE")));
        assert!(statements.iter().any(|s| s.contains("USING GIST (geom)")));
    }

    #[test]
    fn test_item_row_temporal_mapping() {
        let row = ItemRow {
            id: "2023_Asan_B_cog".to_string(),
            collection_id: "nas-assets".to_string(),
            geometry: r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]}"#
                .to_string(),
            bbox: Some(vec![0.0, 0.0, 1.0, 1.0]),
            datetime: None,
            start_datetime: Some("2023-01-01T00:00:00Z".parse().unwrap()),
            end_datetime: Some("2023-12-31T23:59:59Z".parse().unwrap()),
            properties: serde_json::json!({"year": 2023, "region": "Asan", "zone": "B"}),
            assets: serde_json::json!({}),
            links: serde_json::json!([]),
            source_path: "/nas/2023/2023_Asan_B_cog.tif".to_string(),
        };

        let item = Item::try_from(row).unwrap();
        assert!(matches!(item.temporal, ItemTemporal::Interval { .. }));
        assert_eq!(item.properties["region"].as_str(), Some("Asan"));
    }

    #[test]
    fn test_item_row_partial_temporal_rejected() {
        let row = ItemRow {
            id: "x".to_string(),
            collection_id: "c".to_string(),
            geometry: r#"{"type":"Point","coordinates":[0.0,0.0]}"#.to_string(),
            bbox: None,
            datetime: None,
            start_datetime: Some("2023-01-01T00:00:00Z".parse().unwrap()),
            end_datetime: None,
            properties: serde_json::json!({}),
            assets: serde_json::json!({}),
            links: serde_json::json!([]),
            source_path: "/nas/x.tif".to_string(),
        };

        assert!(Item::try_from(row).is_err());
    }
}
