//! fdoc Index - scanning and reverse-dependency indexing
//!
//! This crate fills an [`IndexStore`](fdoc_core::IndexStore) for one
//! project: the scan phase loads every configured source file into the
//! `files` cache, and the index phase builds the `indexes` namespace,
//! mapping each dependency to the files that import it. All per-item
//! work goes through a [`BoundedPool`].
//!
//! ```no_run
//! use fdoc_core::{FileAccess, IndexStore, JsonConfigSource, LocalStorage};
//! use fdoc_index::Indexer;
//! use std::sync::Arc;
//!
//! # async fn run() -> fdoc_core::Result<()> {
//! let root = std::path::PathBuf::from("/work/shop");
//! let files = FileAccess::new(Arc::new(LocalStorage), Arc::new(IndexStore::new()));
//! let indexer = Indexer::new(&root, files, Arc::new(JsonConfigSource::for_project(&root)));
//!
//! let (scan, _) = indexer.run().await?;
//! println!("{} files loaded", scan.files_loaded);
//! # Ok(())
//! # }
//! ```

mod indexer;
mod pool;
mod watcher;

pub use indexer::{IndexOutcome, IndexReport, Indexer, ScanReport, SkipReason};
pub use pool::BoundedPool;
pub use watcher::{apply_change, ProjectWatcher};
