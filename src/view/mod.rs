//! # View registry and indexer
//!
//! A [`View`] is a stateless map/emit function over a document: a named
//! strategy object behind a trait, registered once and looked up by name.
//! [`ViewRegistry`] holds named views; [`index_all`] runs one view over a
//! snapshot of documents and produces the flat list of emitted index
//! entries the query engine sorts and slices.

#[cfg(test)]
mod tests;

use crate::document::Document;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors raised by the view registry and indexer.
#[derive(Debug, Error)]
pub enum ViewError {
    /// `view.map` panicked while indexing a specific document.
    #[error("view '{name}' failed while indexing document '{document_key}': {cause}")]
    MapFailed {
        name: String,
        document_key: String,
        cause: String,
    },

    /// A query referenced a view name that was never registered.
    #[error("no view registered named '{name}'")]
    NotRegistered { name: String },
}

/// A stateless map/emit function over a document. Implementations call
/// `emit` zero or more times per document to contribute index entries;
/// a document that doesn't match the view's predicate simply emits
/// nothing.
pub trait View: Send + Sync {
    /// Inspect `document` and call `emit(indexKey, value)` for each entry
    /// the view wants to contribute. `value` is the emitted payload, or
    /// `None` if the view only cares about the index key.
    fn map(&self, document: &Document, emit: &mut dyn FnMut(Value, Option<Value>));
}

/// One row produced by [`index_all`]: an emitted `(indexKey, value)` pair
/// tagged with the document it came from.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub index_key: Value,
    pub value: Option<Value>,
    pub document_key: String,
    /// Present only when the caller asked for documents to be attached.
    pub document: Option<Document>,
}

/// Name → view mapping. Re-registering a name replaces the prior view.
#[derive(Default)]
pub struct ViewRegistry {
    views: RwLock<HashMap<String, Arc<dyn View>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_view(&self, name: impl Into<String>, view: Arc<dyn View>) {
        self.views
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), view);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn View>> {
        self.views.read().unwrap_or_else(|e| e.into_inner()).get(name).cloned()
    }

    /// Look up `name` and run [`index_all`] over `documents`.
    pub fn query(
        &self,
        name: &str,
        documents: &[(String, Document)],
        include_documents: bool,
    ) -> Result<Vec<IndexEntry>, ViewError> {
        let view = self.get(name).ok_or_else(|| ViewError::NotRegistered {
            name: name.to_string(),
        })?;
        index_all(name, view.as_ref(), documents, include_documents)
    }
}

/// Run `view.map` over every `(key, document)` pair in `documents`,
/// flattening every emitted `(indexKey, value)` pair into an [`IndexEntry`].
/// Documents are visited in the order given; the query engine is
/// responsible for sorting the result. If `view.map` panics on any
/// document, indexing aborts and the panic is wrapped as a
/// [`ViewError::MapFailed`] naming `name` and the offending document —
/// no partial result is returned.
pub fn index_all(
    name: &str,
    view: &dyn View,
    documents: &[(String, Document)],
    include_documents: bool,
) -> Result<Vec<IndexEntry>, ViewError> {
    let mut out = Vec::new();

    for (document_key, document) in documents {
        let mut emitted: Vec<(Value, Option<Value>)> = Vec::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut emit = |k: Value, v: Option<Value>| emitted.push((k, v));
            view.map(document, &mut emit);
        }));

        if let Err(cause) = result {
            return Err(ViewError::MapFailed {
                name: name.to_string(),
                document_key: document_key.clone(),
                cause: panic_message(&cause),
            });
        }

        for (index_key, value) in emitted {
            out.push(IndexEntry {
                index_key,
                value,
                document_key: document_key.clone(),
                document: include_documents.then(|| document.clone()),
            });
        }
    }

    Ok(out)
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "view panicked with a non-string payload".to_string()
    }
}
