//! Wire types for the directory search API
//!
//! The portal is not strict about its JSON: counts sometimes arrive as
//! strings, `pageSize` can be `0` or missing, and `docs` can be `null`.
//! Everything here deserializes leniently so that a readable page is never
//! rejected for its shape.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;

/// One (term, page) pair; pages are 1-indexed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub term: String,
    pub page: u32,
}

impl PageRequest {
    pub fn new(term: impl Into<String>, page: u32) -> Self {
        Self {
            term: term.into(),
            page,
        }
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' page {}", self.term, self.page)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchPage {
    /// Total records matching the term, across all pages
    #[serde(rename = "numFound", default, deserialize_with = "lenient_count")]
    pub num_found: Option<u64>,

    /// Records per page as reported by the server
    #[serde(rename = "pageSize", default, deserialize_with = "lenient_count")]
    pub page_size: Option<u64>,

    /// Raw employee documents on this page
    #[serde(default, deserialize_with = "lenient_docs")]
    pub docs: Vec<RawDocument>,
}

impl SearchPage {
    /// Number of pages for the term this page belongs to
    ///
    /// `ceil(numFound / pageSize)`, never less than 1. A missing or zero
    /// `pageSize` falls back to `default_page_size`.
    pub fn total_pages(&self, default_page_size: u64) -> u32 {
        total_pages(
            self.num_found.unwrap_or(0),
            self.page_size.filter(|&size| size > 0),
            default_page_size,
        )
    }
}

/// Computes `max(1, ceil(num_found / page_size))`
pub fn total_pages(num_found: u64, page_size: Option<u64>, default_page_size: u64) -> u32 {
    let page_size = page_size.unwrap_or(default_page_size).max(1);
    let pages = num_found.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Untyped employee record as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(Map<String, Value>);

impl RawDocument {
    /// Returns the value of `key` as text
    ///
    /// Strings are returned as-is, numbers and booleans are rendered.
    /// Absent keys, `null`, arrays and objects yield `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Value> for RawDocument {
    /// Non-object values become an empty document
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn lenient_docs<'de, D>(deserializer: D) -> Result<Vec<RawDocument>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.into_iter().map(RawDocument::from).collect(),
        _ => Vec::new(),
    })
}
