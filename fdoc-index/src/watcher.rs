//! Applying file changes to the cache.
//!
//! A change only evicts the file's `files` entry, so the next read goes
//! back to storage. Cached manifests and the reverse index are left as
//! they are.

use crate::indexer::Indexer;
use fdoc_core::{normalize_path, FileChange, FileWatcher, IndexStore, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Evicts the cached content of a changed file. Returns whether an entry
/// was present.
pub fn apply_change(store: &IndexStore, change: &FileChange) -> bool {
    let key = normalize_path(change.path());
    let cached = store.files.exists(&key);
    store.files.delete(&key);
    debug!("Applied {:?} (cached: {})", change, cached);
    cached
}

/// Watches every configured directory of a project.
pub struct ProjectWatcher {
    watchers: Vec<FileWatcher>,
    store: Arc<IndexStore>,
}

impl ProjectWatcher {
    /// Starts one watcher per configured directory that exists.
    pub async fn start(indexer: &Indexer) -> Result<Self> {
        let scan = indexer.config().load_scanning_config()?;
        let extensions = scan.normalized_extensions();
        let mut watchers = Vec::new();

        for directory in &scan.directories {
            let path = indexer.directory_path(directory);
            match indexer.files().stat_path(Path::new(&path)).await {
                Ok(stat) if stat.is_directory => {}
                _ => {
                    debug!("Not watching missing directory {}", path);
                    continue;
                }
            }
            watchers.push(indexer.files().watch_directory(Path::new(&path), &extensions)?);
        }

        info!("Watching {} directories", watchers.len());
        Ok(Self {
            watchers,
            store: Arc::clone(indexer.store()),
        })
    }

    pub fn directories(&self) -> usize {
        self.watchers.len()
    }

    /// Drains pending changes, applies them and returns them.
    pub fn poll(&self) -> Vec<FileChange> {
        let changes: Vec<FileChange> = self.watchers.iter().flat_map(|w| w.poll()).collect();
        for change in &changes {
            apply_change(&self.store, change);
        }
        changes
    }
}
