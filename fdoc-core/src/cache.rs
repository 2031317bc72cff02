//! In-memory content cache.
//!
//! The cache is a memoization layer, not a bounded cache: entries live
//! until they are deleted or the process exits. It is split into three
//! independent namespaces that never share keys:
//!
//! - `files`: normalized file path -> file content
//! - `folders`: normalized directory path -> directory entry names
//! - `indexes`: normalized dependency path -> paths of the files importing it
//!
//! Each namespace is a `DashMap`, so single-key operations are atomic and
//! [`Namespace::update`] gives a per-key read-modify-write. Separate
//! `get` then `add` calls are not atomic; overlapping writers to one key
//! are last-write-wins.

use crate::error::{CoreError, Result};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Names of the three cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Files,
    Folders,
    Indexes,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 3] = [Self::Files, Self::Folders, Self::Indexes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Folders => "folders",
            Self::Indexes => "indexes",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheNamespace {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "files" => Ok(Self::Files),
            "folders" => Ok(Self::Folders),
            "indexes" => Ok(Self::Indexes),
            other => Err(CoreError::UnknownNamespace(other.to_string())),
        }
    }
}

/// One key -> value namespace of the cache.
#[derive(Debug)]
pub struct Namespace<V> {
    entries: DashMap<String, V>,
}

impl<V> Default for Namespace<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V: Clone> Namespace<V> {
    pub fn add(&self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every entry, ordered by key.
    pub fn all(&self) -> BTreeMap<String, V> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Read-modify-write of one entry while holding its shard lock.
    ///
    /// Missing entries start from `V::default()`.
    pub fn update<F>(&self, key: impl Into<String>, f: F)
    where
        V: Default,
        F: FnOnce(&mut V),
    {
        let mut entry = self.entries.entry(key.into()).or_default();
        f(entry.value_mut());
    }
}

/// The process-lifetime store that owns all three namespaces.
///
/// Construct one per project and share it by `Arc`.
#[derive(Debug, Default)]
pub struct IndexStore {
    pub files: Namespace<String>,
    pub folders: Namespace<Vec<String>>,
    pub indexes: Namespace<Vec<String>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, ns: CacheNamespace) -> usize {
        match ns {
            CacheNamespace::Files => self.files.count(),
            CacheNamespace::Folders => self.folders.count(),
            CacheNamespace::Indexes => self.indexes.count(),
        }
    }

    pub fn exists(&self, ns: CacheNamespace, key: &str) -> bool {
        match ns {
            CacheNamespace::Files => self.files.exists(key),
            CacheNamespace::Folders => self.folders.exists(key),
            CacheNamespace::Indexes => self.indexes.exists(key),
        }
    }

    pub fn delete(&self, ns: CacheNamespace, key: &str) {
        match ns {
            CacheNamespace::Files => self.files.delete(key),
            CacheNamespace::Folders => self.folders.delete(key),
            CacheNamespace::Indexes => self.indexes.delete(key),
        }
    }

    pub fn clear(&self, ns: CacheNamespace) {
        match ns {
            CacheNamespace::Files => self.files.clear(),
            CacheNamespace::Folders => self.folders.clear(),
            CacheNamespace::Indexes => self.indexes.clear(),
        }
    }

    pub fn keys(&self, ns: CacheNamespace) -> Vec<String> {
        match ns {
            CacheNamespace::Files => self.files.keys(),
            CacheNamespace::Folders => self.folders.keys(),
            CacheNamespace::Indexes => self.indexes.keys(),
        }
    }

    /// JSON view of one entry, or of the whole namespace when `key` is `None`.
    ///
    /// File contents are summarised by their length to keep dumps readable.
    pub fn snapshot(&self, ns: CacheNamespace, key: Option<&str>) -> serde_json::Value {
        fn to_value<T: Serialize>(value: T) -> serde_json::Value {
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
        }

        match (ns, key) {
            (CacheNamespace::Files, Some(key)) => to_value(self.files.get(key)),
            (CacheNamespace::Files, None) => to_value(
                self.files
                    .all()
                    .into_iter()
                    .map(|(k, v)| (k, v.len()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            (CacheNamespace::Folders, Some(key)) => to_value(self.folders.get(key)),
            (CacheNamespace::Folders, None) => to_value(self.folders.all()),
            (CacheNamespace::Indexes, Some(key)) => to_value(self.indexes.get(key)),
            (CacheNamespace::Indexes, None) => to_value(self.indexes.all()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_namespaces_are_isolated() {
        let store = IndexStore::new();
        store.files.add("x", "content".to_string());

        assert!(store.exists(CacheNamespace::Files, "x"));
        assert!(!store.exists(CacheNamespace::Folders, "x"));
        assert!(!store.exists(CacheNamespace::Indexes, "x"));
        assert!(store.indexes.get("x").is_none());
    }

    #[test]
    fn test_namespace_operations() {
        let ns: Namespace<String> = Namespace::default();
        assert!(ns.is_empty());

        ns.add("/a", "1".to_string());
        ns.add("/b", "2".to_string());
        ns.add("/a", "3".to_string());

        assert_eq!(ns.count(), 2);
        assert_eq!(ns.get("/a").as_deref(), Some("3"));
        assert_eq!(ns.keys(), vec!["/a".to_string(), "/b".to_string()]);

        ns.delete("/a");
        assert!(!ns.exists("/a"));
        assert_eq!(ns.all().len(), 1);

        ns.clear();
        assert_eq!(ns.count(), 0);
    }

    #[test]
    fn test_unknown_namespace_is_an_error() {
        assert_eq!(
            "indexes".parse::<CacheNamespace>().unwrap(),
            CacheNamespace::Indexes
        );
        let err = "manifests".parse::<CacheNamespace>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownNamespace(name) if name == "manifests"));
    }

    #[test]
    fn test_update_is_serialised_per_key() {
        let store = Arc::new(IndexStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..100 {
                        store
                            .indexes
                            .update("/dep.ts", |importers| importers.push(format!("{i}-{j}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.indexes.get("/dep.ts").unwrap().len(), 800);
    }

    #[test]
    fn test_snapshot_summarises_files() {
        let store = IndexStore::new();
        store.files.add("/a.ts", "abcd".to_string());
        store.indexes.add("/dep.ts", vec!["/a.ts".to_string()]);

        let files = store.snapshot(CacheNamespace::Files, None);
        assert_eq!(files["/a.ts"], 4);

        let entry = store.snapshot(CacheNamespace::Indexes, Some("/dep.ts"));
        assert_eq!(entry, serde_json::json!(["/a.ts"]));
    }
}
