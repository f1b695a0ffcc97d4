//! Item-search request parsing.
//!
//! Both the GET query-parameter form and the POST body form normalize into a
//! [`SearchRequest`], which the store translates into a filtered query.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use stac_common::{parse_datetime_param, BoundingBox, CatalogError, CatalogResult, DatetimeSpec};

use crate::geometry::Geometry;

/// Default page size when `limit` is not supplied.
pub const DEFAULT_LIMIT: u32 = 100;
/// Largest accepted `limit`.
pub const MAX_LIMIT: u32 = 1000;

/// Query parameters with dedicated semantics; everything else on a GET
/// request is treated as a property equality filter.
const RESERVED_PARAMS: &[&str] = &["bbox", "intersects", "datetime", "collections", "limit", "token"];

/// Comparison operator for a property filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl PropertyOp {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "eq" => Some(PropertyOp::Eq),
            "gt" => Some(PropertyOp::Gt),
            "gte" => Some(PropertyOp::Gte),
            "lt" => Some(PropertyOp::Lt),
            "lte" => Some(PropertyOp::Lte),
            _ => None,
        }
    }
}

/// A single predicate over an Item property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub key: String,
    pub op: PropertyOp,
    pub value: PropertyFilterValue,
}

/// Filter comparand: text equality or numeric comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyFilterValue {
    Text(String),
    Number(f64),
}

/// A normalized item-search request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub collections: Vec<String>,
    pub bbox: Option<BoundingBox>,
    pub intersects: Option<Geometry>,
    pub datetime: Option<DatetimeSpec>,
    pub properties: Vec<PropertyFilter>,
    pub limit: u32,
    pub offset: u64,
}

impl SearchRequest {
    /// Parse the GET form from decoded query pairs. Unreserved parameters
    /// become property equality filters.
    pub fn from_query_pairs(pairs: &HashMap<String, String>) -> CatalogResult<Self> {
        let mut request = SearchRequest {
            limit: DEFAULT_LIMIT,
            ..Default::default()
        };

        if let Some(raw) = pairs.get("bbox") {
            request.bbox = Some(
                BoundingBox::from_query_string(raw)
                    .map_err(|e| CatalogError::QueryRejected(e.to_string()))?,
            );
        }

        if let Some(raw) = pairs.get("intersects") {
            request.intersects = Some(parse_intersects_json(raw)?);
        }

        if let Some(raw) = pairs.get("datetime") {
            request.datetime = Some(
                parse_datetime_param(raw).map_err(|e| CatalogError::QueryRejected(e.to_string()))?,
            );
        }

        if let Some(raw) = pairs.get("collections") {
            request.collections = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(raw) = pairs.get("limit") {
            request.limit = parse_limit_str(raw)?;
        }

        if let Some(raw) = pairs.get("token") {
            request.offset = parse_token(raw)?;
        }

        for (key, value) in pairs {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            request.properties.push(PropertyFilter {
                key: key.clone(),
                op: PropertyOp::Eq,
                value: PropertyFilterValue::Text(value.clone()),
            });
        }
        // HashMap iteration order is arbitrary; keep the filter list stable.
        request.properties.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(request)
    }

    /// Parse the POST body form.
    pub fn from_body(body: &serde_json::Value) -> CatalogResult<Self> {
        let body: SearchBody = serde_json::from_value(body.clone())
            .map_err(|e| CatalogError::QueryRejected(format!("invalid search body: {}", e)))?;

        let mut request = SearchRequest {
            collections: body.collections.unwrap_or_default(),
            intersects: body.intersects,
            limit: DEFAULT_LIMIT,
            ..Default::default()
        };

        if let Some(values) = body.bbox {
            request.bbox = Some(BoundingBox::from_values(&values).ok_or_else(|| {
                CatalogError::QueryRejected(format!(
                    "invalid bbox: expected 4 or 6 ordered values, got {:?}",
                    values
                ))
            })?);
        }

        if let Some(geometry) = &request.intersects {
            geometry
                .validate()
                .map_err(|e| CatalogError::QueryRejected(format!("invalid intersects: {}", e)))?;
        }

        if let Some(raw) = body.datetime {
            request.datetime = Some(
                parse_datetime_param(&raw)
                    .map_err(|e| CatalogError::QueryRejected(e.to_string()))?,
            );
        }

        if let Some(limit) = body.limit {
            request.limit = validate_limit(limit)?;
        }

        if let Some(raw) = body.token {
            request.offset = parse_token(&raw)?;
        }

        if let Some(query) = body.query {
            for (key, ops) in query {
                for (op_key, value) in ops {
                    let op = PropertyOp::from_key(&op_key).ok_or_else(|| {
                        CatalogError::QueryRejected(format!(
                            "unsupported query operator '{}' for property '{}'",
                            op_key, key
                        ))
                    })?;
                    let value = property_comparand(&key, op, &value)?;
                    request.properties.push(PropertyFilter {
                        key: key.clone(),
                        op,
                        value,
                    });
                }
            }
        }

        Ok(request)
    }

    /// The continuation token for the page after this one.
    pub fn next_token(&self) -> String {
        (self.offset + self.limit as u64).to_string()
    }
}

/// Wire shape of the POST /search body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchBody {
    bbox: Option<Vec<f64>>,
    intersects: Option<Geometry>,
    datetime: Option<String>,
    collections: Option<Vec<String>>,
    limit: Option<u32>,
    token: Option<String>,
    query: Option<BTreeMap<String, BTreeMap<String, serde_json::Value>>>,
}

fn parse_intersects_json(raw: &str) -> CatalogResult<Geometry> {
    let geometry: Geometry = serde_json::from_str(raw)
        .map_err(|e| CatalogError::QueryRejected(format!("invalid intersects geometry: {}", e)))?;
    geometry
        .validate()
        .map_err(|e| CatalogError::QueryRejected(format!("invalid intersects geometry: {}", e)))?;
    Ok(geometry)
}

fn parse_limit_str(raw: &str) -> CatalogResult<u32> {
    let limit: u32 = raw
        .parse()
        .map_err(|_| CatalogError::QueryRejected(format!("invalid limit: {}", raw)))?;
    validate_limit(limit)
}

fn validate_limit(limit: u32) -> CatalogResult<u32> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(CatalogError::QueryRejected(format!(
            "limit must be between 1 and {}, got {}",
            MAX_LIMIT, limit
        )));
    }
    Ok(limit)
}

fn parse_token(raw: &str) -> CatalogResult<u64> {
    raw.parse()
        .map_err(|_| CatalogError::QueryRejected(format!("invalid pagination token: {}", raw)))
}

fn property_comparand(
    key: &str,
    op: PropertyOp,
    value: &serde_json::Value,
) -> CatalogResult<PropertyFilterValue> {
    match value {
        serde_json::Value::Number(n) => Ok(PropertyFilterValue::Number(
            n.as_f64().unwrap_or_default(),
        )),
        serde_json::Value::String(s) if op == PropertyOp::Eq => {
            Ok(PropertyFilterValue::Text(s.clone()))
        }
        serde_json::Value::Bool(b) if op == PropertyOp::Eq => {
            Ok(PropertyFilterValue::Text(b.to_string()))
        }
        _ => Err(CatalogError::QueryRejected(format!(
            "unsupported comparand for property '{}': range operators need a number",
            key
        ))),
    }
}
