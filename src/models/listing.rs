//! Paginated listing models.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::Page;

/// One page of a paginated content listing.
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Content summaries in listing order
    pub results: Vec<Page>,

    /// Offset this page was requested at
    pub start: usize,

    /// Requested page size
    pub limit: usize,

    /// True iff the response carried no next-page link
    pub is_last: bool,
}

impl ListingPage {
    /// Parse a listing response.
    pub fn parse(raw: &Value) -> Result<Self> {
        let results = raw
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::parse("listing response missing `results`"))?
            .iter()
            .map(Page::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            results,
            start: usize_field(raw, "start")?,
            limit: usize_field(raw, "limit")?,
            is_last: is_last(raw),
        })
    }
}

/// A named access-control scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    /// Space key, the identity used for authorization
    pub key: String,

    /// Display name
    pub name: String,
}

/// One page of a paginated space listing.
#[derive(Debug, Clone)]
pub struct SpacePage {
    pub results: Vec<Space>,
    pub start: usize,
    pub limit: usize,
    pub is_last: bool,
}

impl SpacePage {
    /// Parse a space listing response.
    pub fn parse(raw: &Value) -> Result<Self> {
        let results = raw
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::parse("space listing missing `results`"))?
            .iter()
            .map(|entry| {
                let key = entry
                    .get("key")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AppError::parse("space record missing `key`"))?;
                let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
                Ok(Space {
                    key: key.to_string(),
                    name: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            results,
            start: usize_field(raw, "start")?,
            limit: usize_field(raw, "limit")?,
            is_last: is_last(raw),
        })
    }
}

fn usize_field(raw: &Value, key: &str) -> Result<usize> {
    raw.get(key)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .ok_or_else(|| AppError::parse(format!("listing response missing `{key}`")))
}

/// The listing is last iff the response has no `_links.next`.
fn is_last(raw: &Value) -> bool {
    raw.pointer("/_links/next").and_then(Value::as_str).is_none()
}
