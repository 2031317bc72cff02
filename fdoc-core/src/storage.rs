//! Storage capability.
//!
//! Everything the core needs from a file system goes through [`Storage`].
//! [`LocalStorage`] is the disk implementation; tests and embedders can
//! provide their own.

use crate::watcher::FileWatcher;
use async_trait::async_trait;
use std::io;
use std::path::Path;

/// What `stat` reports about a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStat {
    /// A real directory. Symbolic links are never reported as directories.
    pub is_directory: bool,
    pub is_symlink: bool,
    pub len: u64,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Entry names (not full paths) of a directory.
    async fn read_directory(&self, path: &Path) -> io::Result<Vec<String>>;

    async fn stat(&self, path: &Path) -> io::Result<PathStat>;

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Creates a directory and any missing parents.
    async fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// Starts watching a directory tree for changes to files with `extensions`.
    fn watch(&self, path: &Path, extensions: &[String]) -> Result<FileWatcher, notify::Error>;
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read_file(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn read_directory(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn stat(&self, path: &Path) -> io::Result<PathStat> {
        // lstat: links are reported as links, which keeps recursive walks
        // from following a link back into an ancestor.
        let meta = tokio::fs::symlink_metadata(path).await?;
        Ok(PathStat {
            is_directory: meta.is_dir(),
            is_symlink: meta.file_type().is_symlink(),
            len: meta.len(),
        })
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    fn watch(&self, path: &Path, extensions: &[String]) -> Result<FileWatcher, notify::Error> {
        FileWatcher::new(path, extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage;
        let nested = dir.path().join("a").join("b");

        storage.mkdir(&nested).await.unwrap();
        let file = nested.join("x.ts");
        storage.write(&file, "export const x = 1;").await.unwrap();

        assert!(storage.exists(&file).await);
        assert!(!storage.exists(&nested.join("y.ts")).await);
        assert_eq!(storage.read_file(&file).await.unwrap(), "export const x = 1;");
        assert_eq!(storage.read_directory(&nested).await.unwrap(), vec!["x.ts"]);
        assert!(storage.stat(&nested).await.unwrap().is_directory);
        assert!(!storage.stat(&file).await.unwrap().is_directory);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stat_does_not_follow_symlinks() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let stat = LocalStorage.stat(&link).await.unwrap();
        assert!(!stat.is_directory);
        assert!(stat.is_symlink);
    }
}
