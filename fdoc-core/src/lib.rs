//! fdoc Core - content cache, file access and import extraction
//!
//! This crate provides the foundations of fdoc's dependency analysis.
//! It reads component-based front-end sources (Vue single-file components
//! and plain TypeScript/JavaScript modules), caches their contents, and
//! turns each file's aliased imports into a [`FileImportManifest`].
//!
//! # Example
//!
//! ```no_run
//! use fdoc_core::{FileAccess, ImportExtractor, IndexStore, JsonConfigSource, LocalStorage};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let root = Path::new("/work/shop");
//! let files = FileAccess::new(Arc::new(LocalStorage), Arc::new(IndexStore::new()));
//! let extractor = ImportExtractor::new(files, Arc::new(JsonConfigSource::for_project(root)));
//!
//! let manifest = extractor.extract(&root.join("components/Cart.vue")).await;
//! for (category, import) in manifest.records() {
//!     println!("{}: {} -> {}", category, import.local_name, import.resolved_path);
//! }
//! # }
//! ```

pub mod alias;
pub mod cache;
pub mod config;
pub mod docs;
pub mod error;
pub mod extractor;
pub mod fs;
pub mod languages;
pub mod manifest;
pub mod parser;
pub mod storage;
pub mod watcher;

pub use alias::{AliasResolver, CategoryMap, DependencyCategory};
pub use cache::{CacheNamespace, IndexStore, Namespace};
pub use config::{
    require_project_root, ConfigSource, JsonConfigSource, ProjectConfig, SandboxSettings,
    ScanConfig,
};
pub use docs::lookup_doc;
pub use error::{CoreError, Result};
pub use extractor::{analyze_file_source, ImportExtractor};
pub use fs::{file_name, normalize_path, resolve_import_path, FileAccess};
pub use manifest::{FileImportManifest, ImportRecord};
pub use parser::{parse_imports, parse_script, ImportDeclaration, ImportSpecifier};
pub use storage::{LocalStorage, PathStat, Storage};
pub use watcher::{FileChange, FileWatcher};
