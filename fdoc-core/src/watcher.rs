//! File watcher for change notifications.
//!
//! Uses the notify crate to watch a directory tree and report changes
//! to files with one of the scanned extensions.

use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use tracing::{debug, info, warn};

/// Type of file change detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Deleted(p) => p,
        }
    }
}

/// Watches a directory for file changes.
pub struct FileWatcher {
    #[allow(dead_code)]
    watcher: notify::RecommendedWatcher,
    receiver: Receiver<FileChange>,
}

impl FileWatcher {
    /// Creates a new file watcher for the given directory.
    ///
    /// `extensions` are dotted (`.vue`); an empty list reports every file.
    pub fn new(root: &Path, extensions: &[String]) -> Result<Self, notify::Error> {
        let (tx, rx) = channel();
        let extensions = extensions.to_vec();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    for path in event.paths {
                        if !matches_extension(&path, &extensions) {
                            continue;
                        }

                        let change = match event.kind {
                            notify::EventKind::Create(_) => {
                                debug!("File created: {}", path.display());
                                Some(FileChange::Created(path))
                            }
                            notify::EventKind::Modify(_) => {
                                debug!("File modified: {}", path.display());
                                Some(FileChange::Modified(path))
                            }
                            notify::EventKind::Remove(_) => {
                                debug!("File deleted: {}", path.display());
                                Some(FileChange::Deleted(path))
                            }
                            _ => None,
                        };

                        if let Some(change) = change {
                            if tx.send(change).is_err() {
                                warn!("Failed to send file change event");
                            }
                        }
                    }
                }
                Err(e) => warn!("Watch error: {}", e),
            }
        })?;

        watcher.watch(root, RecursiveMode::Recursive)?;

        info!("Watching {} for changes", root.display());

        Ok(Self {
            watcher,
            receiver: rx,
        })
    }

    /// Returns immediately with any pending changes.
    pub fn poll(&self) -> Vec<FileChange> {
        self.receiver.try_iter().collect()
    }
}

/// True when `path` ends in one of the dotted `extensions`, or the list is empty.
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions
            .iter()
            .any(|wanted| wanted.strip_prefix('.').unwrap_or(wanted) == ext),
        None => false,
    }
}
