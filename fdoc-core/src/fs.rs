//! File access layer.
//!
//! Thin wrappers over [`Storage`] plus the two cache-aware composites the
//! indexing pipeline is built on: [`FileAccess::get_file`] and
//! [`FileAccess::get_paths_in_folder`].

use crate::cache::IndexStore;
use crate::error::{CoreError, Result};
use crate::storage::{PathStat, Storage};
use crate::watcher::{matches_extension, FileWatcher};
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache-aware access to project files.
#[derive(Clone)]
pub struct FileAccess {
    storage: Arc<dyn Storage>,
    store: Arc<IndexStore>,
}

impl FileAccess {
    pub fn new(storage: Arc<dyn Storage>, store: Arc<IndexStore>) -> Self {
        Self { storage, store }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub async fn file_exists(&self, path: &Path) -> bool {
        self.storage.exists(path).await
    }

    pub async fn read_file(&self, path: &Path) -> Result<String> {
        self.storage
            .read_file(path)
            .await
            .map_err(|e| CoreError::io(path, e))
    }

    pub async fn read_directory(&self, path: &Path) -> Result<Vec<String>> {
        self.storage
            .read_directory(path)
            .await
            .map_err(|e| CoreError::io(path, e))
    }

    pub async fn stat_path(&self, path: &Path) -> Result<PathStat> {
        self.storage
            .stat(path)
            .await
            .map_err(|e| CoreError::io(path, e))
    }

    pub fn watch_directory(&self, path: &Path, extensions: &[String]) -> Result<FileWatcher> {
        Ok(self.storage.watch(path, extensions)?)
    }

    /// Returns the file content, from the `files` cache when present.
    ///
    /// Read failures are swallowed: the stale cache entry (if any) is
    /// evicted and an empty string is returned, so callers cannot tell an
    /// empty file from an unreadable one.
    pub async fn get_file(&self, path: &Path) -> String {
        let key = normalize_path(path);
        if let Some(content) = self.store.files.get(&key) {
            return content;
        }

        match self.storage.read_file(path).await {
            Ok(content) => {
                self.store.files.add(key, content.clone());
                content
            }
            Err(e) => {
                self.store.files.delete(&key);
                warn!("File {} not found: {}", path.display(), e);
                String::new()
            }
        }
    }

    /// Recursively lists files under `root` whose extension is in
    /// `extensions` (all files when `extensions` is empty).
    ///
    /// A missing `root` yields nothing. Each directory listing is recorded
    /// in the `folders` cache. Symbolic links are not descended into.
    pub async fn get_paths_in_folder(&self, root: &Path, extensions: &[String]) -> Result<Vec<String>> {
        let mut found = Vec::new();
        self.walk(root.to_path_buf(), extensions, &mut found).await?;
        Ok(found)
    }

    fn walk<'a>(
        &'a self,
        dir: PathBuf,
        extensions: &'a [String],
        found: &'a mut Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if !self.storage.exists(&dir).await {
                debug!("Skipping missing folder {}", dir.display());
                return Ok(());
            }

            let entries = self.read_directory(&dir).await?;
            self.store.folders.add(normalize_path(&dir), entries.clone());

            for name in entries {
                let full_path = dir.join(&name);
                let stat = self.stat_path(&full_path).await?;

                if stat.is_directory {
                    self.walk(full_path, extensions, found).await?;
                } else if matches_extension(&full_path, extensions) {
                    found.push(normalize_path(&full_path));
                }
            }
            Ok(())
        })
    }
}

/// Lexically normalizes a path and renders it with forward slashes.
///
/// `.` segments are dropped and `..` pops the previous segment; nothing
/// touches the disk, so links are not resolved.
pub fn normalize_path(path: &Path) -> String {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    let rendered = normalized.to_string_lossy().replace('\\', "/");
    if rendered.is_empty() {
        ".".to_string()
    } else {
        rendered
    }
}

/// Turns a resolved import path (`../components/Foo.vue`) into the
/// normalized absolute path of the file under `root`.
pub fn resolve_import_path(root: &Path, import_path: &str) -> String {
    let relative = import_path.replacen("..", "", 1);
    let root = root.to_string_lossy();
    let joined = if relative.starts_with('/') {
        format!("{}{}", root, relative)
    } else {
        format!("{}/{}", root, relative)
    };
    normalize_path(Path::new(&joined))
}

/// Final path segment, as shown in trees and manifests.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
