//! Item query filters and their SQL translation.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use stac_common::BoundingBox;
use stac_protocol::search::{PropertyFilterValue, PropertyOp, SearchRequest};
use stac_protocol::Geometry;

/// Inclusive temporal interval filter; open on either side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// A normalized predicate over a single property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPredicate {
    pub key: String,
    pub op: PropertyOp,
    pub value: PropertyFilterValue,
}

/// Filter criteria for finding items.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub collections: Vec<String>,
    pub bbox: Option<BoundingBox>,
    pub intersects: Option<Geometry>,
    pub temporal: Option<TemporalFilter>,
    pub properties: Vec<PropertyPredicate>,
    pub limit: u32,
    pub offset: u64,
}

impl From<&SearchRequest> for ItemFilter {
    fn from(request: &SearchRequest) -> Self {
        let temporal = request.datetime.as_ref().map(|spec| {
            let (start, end) = spec.bounds();
            TemporalFilter { start, end }
        });

        ItemFilter {
            collections: request.collections.clone(),
            bbox: request.bbox,
            intersects: request.intersects.clone(),
            temporal,
            properties: request
                .properties
                .iter()
                .map(|f| PropertyPredicate {
                    key: f.key.clone(),
                    op: f.op,
                    value: f.value.clone(),
                })
                .collect(),
            limit: request.limit,
            offset: request.offset,
        }
    }
}

const ITEM_COLUMNS: &str = "id, collection_id, ST_AsGeoJSON(geom) AS geometry, bbox, \
     datetime, start_datetime, end_datetime, properties, assets, links, source_path";

/// Assemble the parameterized SELECT for a filter. Ordering is fixed to
/// `(id, collection_id)` so pagination tokens stay stable for an unchanged
/// dataset.
pub(crate) fn build_find_query(filter: &ItemFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM items WHERE TRUE", ITEM_COLUMNS));

    if !filter.collections.is_empty() {
        builder
            .push(" AND collection_id = ANY(")
            .push_bind(filter.collections.clone())
            .push(")");
    }

    if let Some(bbox) = &filter.bbox {
        builder
            .push(" AND ST_Intersects(geom, ST_MakeEnvelope(")
            .push_bind(bbox.min_x)
            .push(", ")
            .push_bind(bbox.min_y)
            .push(", ")
            .push_bind(bbox.max_x)
            .push(", ")
            .push_bind(bbox.max_y)
            .push(", 4326))");
    }

    if let Some(geometry) = &filter.intersects {
        let geojson = serde_json::to_string(geometry).unwrap_or_default();
        builder
            .push(" AND ST_Intersects(geom, ST_SetSRID(ST_GeomFromGeoJSON(")
            .push_bind(geojson)
            .push("), 4326))");
    }

    if let Some(temporal) = &filter.temporal {
        // An item's range is [start_datetime, end_datetime] or the single
        // datetime instant; overlap keeps items whose range touches the query.
        if let Some(start) = temporal.start {
            builder
                .push(" AND COALESCE(end_datetime, datetime) >= ")
                .push_bind(start);
        }
        if let Some(end) = temporal.end {
            builder
                .push(" AND COALESCE(start_datetime, datetime) <= ")
                .push_bind(end);
        }
    }

    for predicate in &filter.properties {
        match (&predicate.value, predicate.op) {
            (PropertyFilterValue::Text(text), PropertyOp::Eq) => {
                builder
                    .push(" AND properties->>")
                    .push_bind(predicate.key.clone())
                    .push(" = ")
                    .push_bind(text.clone());
            }
            (PropertyFilterValue::Number(number), op) => {
                builder
                    .push(" AND properties->")
                    .push_bind(predicate.key.clone())
                    .push(sql_op(op))
                    .push("to_jsonb(")
                    .push_bind(*number)
                    .push("::double precision)");
            }
            (PropertyFilterValue::Text(text), _) => {
                // Range over text is not offered; fall back to equality.
                builder
                    .push(" AND properties->>")
                    .push_bind(predicate.key.clone())
                    .push(" = ")
                    .push_bind(text.clone());
            }
        }
    }

    builder
        .push(" ORDER BY id, collection_id LIMIT ")
        .push_bind(filter.limit as i64)
        .push(" OFFSET ")
        .push_bind(filter.offset as i64);

    builder
}

fn sql_op(op: PropertyOp) -> &'static str {
    match op {
        PropertyOp::Eq => " = ",
        PropertyOp::Gt => " > ",
        PropertyOp::Gte => " >= ",
        PropertyOp::Lt => " < ",
        PropertyOp::Lte => " <= ",
    }
}
