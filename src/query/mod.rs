//! # Query engine
//!
//! Builds a sorted, sliced, paginated view over either the primary-key
//! space (`query_keys`) or a registered view's emitted index
//! (`query_view`), sharing the same [`QueryOptions`] normalization,
//! range-bounds slicing (§4.2, [`crate::search::range_bounds`]), and
//! pagination math, mirroring the teacher's `Engine::scan` range-query
//! surface generalized from byte ranges to arbitrary JSON key ranges.


use crate::comparator::{Comparator, DefaultComparator};
use crate::document::Document;
use crate::search::range_bounds;
use crate::view::{IndexEntry, ViewError, ViewRegistry};
use serde_json::Value;
use thiserror::Error;

/// Sorts at-or-below every realistic textual key.
pub const ALPHA: &str = "\u{0}";
/// Sorts at-or-above every realistic textual key.
pub const OMEGA: &str = "\u{ffff}";

/// Errors raised while building or running a query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("inclusive_start_index must be >= 0, got {0}")]
    InvalidInclusiveStartIndex(i64),

    #[error("limit must be > 0, got {0}")]
    InvalidLimit(i64),

    #[error(transparent)]
    View(#[from] ViewError),
}

/// Caller-facing query options. Unset bounds fall back to [`ALPHA`]/[`OMEGA`]
/// per direction at normalization time; see [`QueryOptions::normalize`].
#[derive(Debug, Clone)]
pub struct QueryOptions {
    key: Option<Value>,
    start_key: Option<Value>,
    end_key: Option<Value>,
    descending: bool,
    inclusive_start_index: i64,
    limit: i64,
    include_documents: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            key: None,
            start_key: None,
            end_key: None,
            descending: false,
            inclusive_start_index: 0,
            limit: 10,
            include_documents: false,
        }
    }
}

impl QueryOptions {
    pub fn key(mut self, key: Value) -> Self {
        self.key = Some(key);
        self
    }

    pub fn start_key(mut self, key: Value) -> Self {
        self.start_key = Some(key);
        self
    }

    pub fn end_key(mut self, key: Value) -> Self {
        self.end_key = Some(key);
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    pub fn inclusive_start_index(mut self, index: i64) -> Self {
        self.inclusive_start_index = index;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn include_documents(mut self, include: bool) -> Self {
        self.include_documents = include;
        self
    }

    fn normalize(&self) -> Result<NormalizedQuery, QueryError> {
        if self.inclusive_start_index < 0 {
            return Err(QueryError::InvalidInclusiveStartIndex(self.inclusive_start_index));
        }
        if self.limit <= 0 {
            return Err(QueryError::InvalidLimit(self.limit));
        }

        let (default_start, default_end) = if self.descending {
            (Value::String(OMEGA.to_string()), Value::String(ALPHA.to_string()))
        } else {
            (Value::String(ALPHA.to_string()), Value::String(OMEGA.to_string()))
        };

        let (start_key, end_key) = if let Some(key) = &self.key {
            (key.clone(), key.clone())
        } else {
            (
                self.start_key.clone().unwrap_or(default_start),
                self.end_key.clone().unwrap_or(default_end),
            )
        };

        Ok(NormalizedQuery {
            start_key,
            end_key,
            descending: self.descending,
            inclusive_start_index: self.inclusive_start_index as usize,
            limit: self.limit as usize,
            include_documents: self.include_documents,
        })
    }
}

struct NormalizedQuery {
    start_key: Value,
    end_key: Value,
    descending: bool,
    inclusive_start_index: usize,
    limit: usize,
    include_documents: bool,
}

/// A single page of query results.
#[derive(Debug, Clone)]
pub struct QueryPage {
    pub items: Vec<IndexEntry>,
    /// `inclusive_start_index` for the next page, or `None` if this was
    /// the last one.
    pub exclusive_end_index: Option<usize>,
}

fn sort_and_page(mut entries: Vec<IndexEntry>, norm: &NormalizedQuery) -> (Vec<IndexEntry>, Option<usize>) {
    let cmp = DefaultComparator;
    if norm.descending {
        entries.sort_by(|a, b| cmp.compare(&b.index_key, &a.index_key));
    } else {
        entries.sort_by(|a, b| cmp.compare(&a.index_key, &b.index_key));
    }

    let (start, end) = range_bounds(
        &entries,
        &norm.start_key,
        &norm.end_key,
        norm.descending,
        |e| &e.index_key,
        &cmp,
    );

    let window_start = start.max(norm.inclusive_start_index);
    if window_start >= end {
        return (Vec::new(), None);
    }

    let window_end = (window_start + norm.limit).min(end);
    let page = entries[window_start..window_end].to_vec();

    let exclusive_end_index = if window_end < end {
        Some(window_end)
    } else {
        None
    };

    (page, exclusive_end_index)
}

/// Query over the primary-key space: every key is its own index entry.
/// `lookup` resolves a primary key to its current document, used only to
/// attach documents to the final page when `include_documents` is set —
/// documents are not cloned for every candidate key, only the ones that
/// survive slicing and pagination.
pub fn query_keys(
    keys: &[String],
    opts: &QueryOptions,
    lookup: impl Fn(&str) -> Option<Document>,
) -> Result<QueryPage, QueryError> {
    let norm = opts.normalize()?;

    let entries: Vec<IndexEntry> = keys
        .iter()
        .map(|k| IndexEntry {
            index_key: Value::String(k.clone()),
            value: None,
            document_key: k.clone(),
            document: None,
        })
        .collect();

    let (mut page, exclusive_end_index) = sort_and_page(entries, &norm);
    if norm.include_documents {
        for entry in &mut page {
            entry.document = lookup(&entry.document_key);
        }
    }

    Ok(QueryPage {
        items: page,
        exclusive_end_index,
    })
}

/// Query over a registered view's emitted index. `documents` is the full
/// snapshot the view is run over; unlike `query_keys`, documents (if
/// requested) are attached at indexing time for every emitted entry, per
/// the view indexer's contract.
pub fn query_view(
    registry: &ViewRegistry,
    name: &str,
    documents: &[(String, Document)],
    opts: &QueryOptions,
) -> Result<QueryPage, QueryError> {
    let norm = opts.normalize()?;
    let entries = registry.query(name, documents, norm.include_documents)?;
    let (page, exclusive_end_index) = sort_and_page(entries, &norm);
    Ok(QueryPage {
        items: page,
        exclusive_end_index,
    })
}
