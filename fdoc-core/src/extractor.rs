//! Import extraction.
//!
//! Produces the [`FileImportManifest`] of a source file. Successful
//! results are cached for the lifetime of the extractor and never
//! invalidated: a file edited after its first analysis keeps its old
//! manifest until the process restarts.

use crate::alias::{AliasResolver, CategoryMap};
use crate::config::{ConfigSource, ScanConfig};
use crate::error::{CoreError, Result};
use crate::fs::{normalize_path, FileAccess};
use crate::languages::{detect_language, SourceLanguage};
use crate::manifest::FileImportManifest;
use crate::parser::parse_imports;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct ImportExtractor {
    files: FileAccess,
    config: Arc<dyn ConfigSource>,
    manifests: DashMap<String, Arc<FileImportManifest>>,
}

impl ImportExtractor {
    pub fn new(files: FileAccess, config: Arc<dyn ConfigSource>) -> Self {
        Self {
            files,
            config,
            manifests: DashMap::new(),
        }
    }

    pub fn files(&self) -> &FileAccess {
        &self.files
    }

    /// Number of cached manifests.
    pub fn cached(&self) -> usize {
        self.manifests.len()
    }

    /// Returns the manifest of `path`. Never fails: missing files,
    /// unsupported kinds, empty scripts and parse failures all yield a
    /// name/path-only manifest.
    pub async fn extract(&self, path: &Path) -> Arc<FileImportManifest> {
        if !self.files.file_exists(path).await {
            return Arc::new(FileImportManifest::empty(path));
        }

        let key = normalize_path(path);
        if let Some(cached) = self.manifests.get(&key) {
            return Arc::clone(cached.value());
        }

        let Some(language) = detect_language(path) else {
            warn!("Unsupported file type: {}", path.display());
            return Arc::new(FileImportManifest::empty(path));
        };

        let code = self.files.get_file(path).await;

        let scan = match self.config.load_scanning_config() {
            Ok(scan) => scan,
            Err(e) => {
                warn!("Failed to load scanning config: {}", e);
                return Arc::new(FileImportManifest::empty(path));
            }
        };

        match analyze_source(path, language.as_ref(), &code, &scan) {
            Ok(Some(manifest)) => {
                let manifest = Arc::new(manifest);
                self.manifests.insert(key, Arc::clone(&manifest));
                manifest
            }
            Ok(None) => {
                debug!("No script content in {}", path.display());
                Arc::new(FileImportManifest::empty(path))
            }
            Err(e) => {
                error!("Error parsing script content of {}: {}", path.display(), e);
                Arc::new(FileImportManifest::empty(path))
            }
        }
    }
}

/// Builds a manifest from already-loaded source text.
///
/// Returns `Ok(None)` when the unit has no script to analyse.
pub fn analyze_source(
    path: &Path,
    language: &dyn SourceLanguage,
    code: &str,
    scan: &ScanConfig,
) -> Result<Option<FileImportManifest>> {
    let Some(script) = language.script_text(code) else {
        return Ok(None);
    };

    let declarations = parse_imports(&script)?;
    let resolver = AliasResolver::new(scan);
    let mut categories = CategoryMap::new();
    for declaration in &declarations {
        resolver.apply(declaration, &mut categories);
    }

    Ok(Some(FileImportManifest::with_categories(path, categories)))
}

/// Like [`analyze_source`] but detects the kind from the path.
pub fn analyze_file_source(path: &Path, code: &str, scan: &ScanConfig) -> Result<Option<FileImportManifest>> {
    let language =
        detect_language(path).ok_or_else(|| CoreError::UnsupportedSource(path.to_path_buf()))?;
    analyze_source(path, language.as_ref(), code, scan)
}
