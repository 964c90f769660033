//! # foliodb
//!
//! An embeddable, single-process document store: an in-memory document map
//! backed one-file-per-document on disk, optimistic concurrency via a
//! monotonic `_rev` counter, a per-key FIFO locking queue serializing
//! same-key mutations, and pluggable map/emit secondary indexes queried
//! through a shared binary-search range engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Engine                            │
//! │  ┌────────────┐   ┌───────────────┐   ┌────────────────┐  │
//! │  │  Locking    │   │   Document    │   │  View registry │  │
//! │  │  queue      │   │   store       │   │  + indexer     │  │
//! │  │  (per-key   │   │  (memory map  │   │  (named,       │  │
//! │  │  FIFO)      │   │  + one JSON   │   │  pluggable     │  │
//! │  │             │   │  file each)   │   │  map/emit)     │  │
//! │  └─────┬───────┘   └──────┬────────┘   └───────┬────────┘  │
//! │        │ serializes       │ read/write         │ indexes   │
//! │        │ mutations        │                    │           │
//! │        └──────────────────┴────────────────────┘           │
//! │                           │                                │
//! │                  ┌────────┴─────────┐                      │
//! │                  │   Query engine    │                      │
//! │                  │  (sort, binary-   │                      │
//! │                  │  search slice,    │                      │
//! │                  │  paginate)        │                      │
//! │                  └───────────────────┘                      │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | Facade — open, load, get/set/update/delete, query |
//! | [`document`] | The structured `Document` type and its `_rev` field |
//! | [`store`] | In-memory map + on-disk JSON file persistence |
//! | [`lock`] | Per-key FIFO mutual exclusion with atomic handoff |
//! | [`view`] | Named, pluggable map/emit secondary indexes |
//! | [`query`] | Shared sort/slice/paginate query engine |
//! | [`comparator`] | Total order over index keys |
//! | [`search`] | Binary-search range bounds over sorted slices |
//! | [`filename`] | Primary key ↔ on-disk filename mapping |
//!
//! ## Key Features
//!
//! - **One file per document** — every document lives at its own
//!   percent-encoded path; no internal log or compaction.
//! - **Optimistic concurrency** — `_rev` must match the stored value on a
//!   checked write, or the write fails with a conflict rather than silently
//!   clobbering a concurrent change.
//! - **Per-key FIFO locking** — mutations on the same key are serialized in
//!   strict arrival order without blocking unrelated keys.
//! - **Pluggable secondary indexes** — a view is a stateless `map` function;
//!   queries over it share the same range/pagination machinery as primary
//!   key queries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foliodb::document::Document;
//! use foliodb::engine::{Engine, EngineConfig, WriteOptions};
//! use serde_json::json;
//!
//! let engine = Engine::new(EngineConfig::new("/tmp/my_docs"));
//! engine.load().unwrap();
//!
//! let doc = Document::from_value(json!({"name": "ada"})).unwrap();
//! let stored = engine.set_item("u1", doc, WriteOptions::default()).unwrap();
//! assert_eq!(stored.rev(), Some(0));
//!
//! let fetched = engine.get_item("u1").unwrap().unwrap();
//! assert_eq!(fetched.get("name"), Some(&json!("ada")));
//!
//! engine.delete_item("u1").unwrap();
//! assert!(engine.get_item("u1").unwrap().is_none());
//! ```

#![allow(dead_code)]

pub mod comparator;
pub mod document;
pub mod engine;
pub mod filename;
pub mod lock;
pub mod query;
pub mod search;
pub mod store;
pub mod view;

pub use query::{ALPHA, OMEGA};
