//! # Engine facade
//!
//! [`Engine`] is the single entry point embedders talk to: it owns a
//! [`DocumentStore`], a [`LockingQueue`], and a [`ViewRegistry`], and wires
//! them together into `get_item`/`set_item`/`update_item`/`delete_item`/
//! `query_keys`/`query_view`, each acquiring the per-key lock around its
//! mutation and releasing it before returning — the same "acquire state
//! lock, mutate, release" discipline the teacher's `Engine` applies around
//! its single coarse `RwLock`, specialized here to a per-key granularity.
//!
//! `Engine` is cheap to clone (`Arc`-backed) so multiple threads can share
//! one handle.

#[cfg(test)]
mod tests;

use crate::document::Document;
use crate::lock::LockingQueue;
use crate::query::{query_keys, query_view, QueryError, QueryOptions, QueryPage};
use crate::store::{DefaultFileSystem, DocumentStore, FileSystemAdapter, StoreError};
use crate::view::{View, ViewError, ViewRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors raised by any [`Engine`] operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `_rev` mismatch on a consistency-checked write.
    #[error("revision conflict on '{key}': caller supplied {caller_rev:?}, stored is {stored_rev:?}")]
    Conflict {
        key: String,
        caller_rev: Option<u64>,
        stored_rev: Option<u64>,
    },

    /// A caller-side policy (e.g. a wrapper requiring a key to already
    /// exist) raised this explicitly; the core never raises it on its own.
    #[error("document '{0}' not found")]
    NotFound(String),

    /// Bad arguments: empty key, non-positive limit, unregistered view,
    /// wrong type. Raised before any I/O.
    #[error("programmer error: {0}")]
    Programmer(String),

    /// Error from the document store (disk I/O, parse failure).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error from the view indexer.
    #[error(transparent)]
    View(#[from] ViewError),

    /// Error from the query engine.
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Construction-time configuration for an [`Engine`].
pub struct EngineConfig {
    /// Directory all document files live in, flat (no subdirectories).
    pub directory: PathBuf,
    /// Batch size for parallel-within-batch loading on [`Engine::load`].
    pub load_batch_size: usize,
    /// Whether the default filesystem adapter `fsync`s before renaming a
    /// written file into place.
    pub fsync_on_write: bool,
    /// Filesystem adapter to use; defaults to the real filesystem.
    pub fs: Arc<dyn FileSystemAdapter>,
    /// Locking queue to use; defaults to a fresh, empty one.
    pub locks: Arc<LockingQueue>,
}

impl EngineConfig {
    /// A config pointed at `directory` with every other field defaulted.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let fsync_on_write = true;
        Self {
            directory: directory.into(),
            load_batch_size: 50,
            fsync_on_write,
            fs: Arc::new(DefaultFileSystem::new(fsync_on_write)),
            locks: Arc::new(LockingQueue::new()),
        }
    }
}

/// Per-write options.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// When true (the default) and the caller-supplied document carries a
    /// `_rev`, it must match the stored `_rev` or the write fails with
    /// [`EngineError::Conflict`].
    pub check_consistency: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            check_consistency: true,
        }
    }
}

/// The document-store facade. Clone freely; clones share the same
/// underlying store, locks, and view registry.
#[derive(Clone)]
pub struct Engine {
    store: Arc<DocumentStore>,
    locks: Arc<LockingQueue>,
    views: Arc<ViewRegistry>,
}

impl Engine {
    /// Build an engine against `config`. Does not touch disk; call
    /// [`Engine::load`] to populate memory from an existing directory.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: Arc::new(DocumentStore::new(
                config.directory,
                config.fs,
                config.load_batch_size,
            )),
            locks: config.locks,
            views: Arc::new(ViewRegistry::new()),
        }
    }

    /// Populate the in-memory map from the configured directory.
    pub fn load(&self) -> Result<(), EngineError> {
        self.store.load()?;
        info!(count = self.store.len(), "engine loaded");
        Ok(())
    }

    /// Register a view under `name`, replacing any prior view with that
    /// name.
    pub fn register_view(&self, name: impl Into<String>, view: Arc<dyn View>) {
        self.views.register_view(name, view);
    }

    /// A deep clone of the document stored at `key`, or `None`. Lock-free.
    pub fn get_item(&self, key: &str) -> Result<Option<Document>, EngineError> {
        require_nonempty_key(key)?;
        Ok(self.store.get(key))
    }

    /// Create or replace the document at `key`. See module docs for the
    /// consistency-check and revision-bump discipline.
    pub fn set_item(
        &self,
        key: &str,
        doc: Document,
        opts: WriteOptions,
    ) -> Result<Document, EngineError> {
        require_nonempty_key(key)?;
        let _guard = self.locks.acquire(key);

        let existing = self.store.get(key);
        let next_rev = self.check_and_bump(key, &existing, doc.rev(), opts)?;
        let stamped = doc.with_rev(next_rev);

        self.store.write(key, &stamped).map_err(|e| {
            error!(key, error = %e, "set_item write failed");
            EngineError::from(e)
        })?;
        Ok(stamped)
    }

    /// Read-modify-write `key` through `f`. `f` receives a clone of the
    /// current document (`None` if absent) and returns the next document
    /// to store (caller-controlled `_rev`, checked and bumped exactly like
    /// [`Engine::set_item`]), or an error that propagates untouched. On an
    /// absent key, `f(None)` may return `Some(document)` to create it at
    /// revision `0`; the engine never raises [`EngineError::NotFound`] on
    /// its own.
    pub fn update_item<F, E>(
        &self,
        key: &str,
        f: F,
        opts: WriteOptions,
    ) -> Result<Option<Document>, E>
    where
        F: FnOnce(Option<Document>) -> Result<Option<Document>, E>,
        E: From<EngineError>,
    {
        require_nonempty_key(key).map_err(E::from)?;
        let _guard = self.locks.acquire(key);

        let existing = self.store.get(key);
        let next_doc = match f(existing.clone())? {
            Some(doc) => doc,
            None => return Ok(None),
        };

        let next_rev = self
            .check_and_bump(key, &existing, next_doc.rev(), opts)
            .map_err(E::from)?;
        let stamped = next_doc.with_rev(next_rev);

        self.store.write(key, &stamped).map_err(|e| {
            error!(key, error = %e, "update_item write failed");
            E::from(EngineError::from(e))
        })?;
        Ok(Some(stamped))
    }

    /// Remove `key`. Idempotent: removing an absent key succeeds.
    pub fn delete_item(&self, key: &str) -> Result<String, EngineError> {
        require_nonempty_key(key)?;
        let _guard = self.locks.acquire(key);
        self.store.remove(key).map_err(|e| {
            error!(key, error = %e, "delete_item failed");
            EngineError::from(e)
        })?;
        Ok(key.to_string())
    }

    /// Sorted, sliced, paginated query over the primary-key space.
    pub fn query_keys(&self, opts: &QueryOptions) -> Result<QueryPage, EngineError> {
        let keys = self.store.keys();
        let store = Arc::clone(&self.store);
        Ok(query_keys(&keys, opts, move |k| store.get(k))?)
    }

    /// Sorted, sliced, paginated query over a registered view's emitted
    /// index.
    pub fn query_view(&self, name: &str, opts: &QueryOptions) -> Result<QueryPage, EngineError> {
        if self.views.get(name).is_none() {
            return Err(EngineError::View(ViewError::NotRegistered {
                name: name.to_string(),
            }));
        }
        let documents = self.store.snapshot();
        Ok(query_view(&self.views, name, &documents, opts)?)
    }

    /// Validate `caller_rev` against the currently stored revision (when
    /// consistency checking is on and both are present) and compute the
    /// revision the write should be stamped with.
    fn check_and_bump(
        &self,
        key: &str,
        existing: &Option<Document>,
        caller_rev: Option<u64>,
        opts: WriteOptions,
    ) -> Result<u64, EngineError> {
        let stored_rev = existing.as_ref().and_then(Document::rev);

        if opts.check_consistency {
            if let (Some(_), Some(caller_rev)) = (existing, caller_rev) {
                if Some(caller_rev) != stored_rev {
                    warn!(key, caller_rev, ?stored_rev, "revision conflict");
                    return Err(EngineError::Conflict {
                        key: key.to_string(),
                        caller_rev: Some(caller_rev),
                        stored_rev,
                    });
                }
            }
        }

        Ok(stored_rev.map_or(0, |r| r + 1))
    }
}

fn require_nonempty_key(key: &str) -> Result<(), EngineError> {
    if key.is_empty() {
        return Err(EngineError::Programmer("key must not be empty".to_string()));
    }
    Ok(())
}
