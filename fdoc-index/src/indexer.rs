//! Scan and index phases.
//!
//! The scan phase fills the `files` cache with the contents of every
//! matching file under the configured directories. The index phase turns
//! the cached files into the reverse-dependency index (`indexes`), where
//! each dependency path maps to the files that import it.
//!
//! Both phases run their per-item work on a [`BoundedPool`] and isolate
//! per-item failures: one unreadable directory or file is logged and the
//! phase carries on.

use crate::pool::BoundedPool;
use fdoc_core::{
    normalize_path, resolve_import_path, CacheNamespace, ConfigSource, FileAccess,
    ImportExtractor, IndexStore, Result,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of a scan.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Directories that were enumerated.
    pub directories: usize,

    /// Matching files found across all directories.
    pub files_found: usize,

    /// Files whose content is now in the `files` cache.
    pub files_loaded: usize,

    /// Directories or files that could not be read.
    pub failures: Vec<String>,

    pub duration_ms: u64,
}

/// Why the index phase did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The `files` cache is empty; scan first.
    NothingScanned,
    /// The `indexes` cache already has entries.
    AlreadyIndexed,
}

/// Result of the index phase.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    /// Files handed to the extractor.
    pub files_analyzed: usize,

    /// Files that had at least one recorded dependency.
    pub files_with_dependencies: usize,

    /// Importer -> dependency pairs appended to the index.
    pub edges: usize,

    /// Entries in the reverse index afterwards.
    pub entries: usize,

    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub enum IndexOutcome {
    Indexed(IndexReport),
    Skipped(SkipReason),
}

impl IndexOutcome {
    pub fn report(&self) -> Option<&IndexReport> {
        match self {
            Self::Indexed(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}

/// Drives both phases for one project root.
pub struct Indexer {
    root: PathBuf,
    files: FileAccess,
    config: Arc<dyn ConfigSource>,
    extractor: Arc<ImportExtractor>,
    pool: BoundedPool,
}

impl Indexer {
    /// Creates an indexer with its own import extractor.
    pub fn new(root: impl Into<PathBuf>, files: FileAccess, config: Arc<dyn ConfigSource>) -> Self {
        let extractor = Arc::new(ImportExtractor::new(files.clone(), Arc::clone(&config)));
        Self::with_extractor(root, files, config, extractor)
    }

    /// Creates an indexer that shares an existing extractor (and its
    /// manifest cache) with other consumers.
    pub fn with_extractor(
        root: impl Into<PathBuf>,
        files: FileAccess,
        config: Arc<dyn ConfigSource>,
        extractor: Arc<ImportExtractor>,
    ) -> Self {
        let pool = BoundedPool::new(config.concurrency());
        Self {
            root: root.into(),
            files,
            config,
            extractor,
            pool,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        self.files.store()
    }

    pub fn extractor(&self) -> &Arc<ImportExtractor> {
        &self.extractor
    }

    pub fn files(&self) -> &FileAccess {
        &self.files
    }

    pub fn config(&self) -> &Arc<dyn ConfigSource> {
        &self.config
    }

    /// Absolute, normalized path of a configured directory (`/components`).
    pub fn directory_path(&self, directory: &str) -> String {
        let root = self.root.to_string_lossy();
        normalize_path(Path::new(&format!(
            "{}/{}",
            root.trim_end_matches('/'),
            directory.trim_start_matches('/')
        )))
    }

    /// Enumerates the configured directories and loads every matching
    /// file into the `files` cache.
    pub async fn scan(&self) -> Result<ScanReport> {
        let start = Instant::now();
        let scan = self.config.load_scanning_config()?;
        let extensions = Arc::new(scan.normalized_extensions());
        let mut report = ScanReport {
            directories: scan.directories.len(),
            ..ScanReport::default()
        };

        info!(
            "Scanning {} director{} under {}",
            scan.directories.len(),
            if scan.directories.len() == 1 { "y" } else { "ies" },
            self.root.display()
        );

        let listings = self
            .pool
            .run(scan.directories.iter().map(|directory| {
                let files = self.files.clone();
                let extensions = Arc::clone(&extensions);
                let path = self.directory_path(directory);
                move || async move {
                    let found = files.get_paths_in_folder(Path::new(&path), &extensions).await;
                    (path, found)
                }
            }))
            .await;

        let mut paths = Vec::new();
        for listing in listings {
            match listing {
                Ok((_, Ok(found))) => paths.extend(found),
                Ok((path, Err(e))) => {
                    warn!("Failed to enumerate {}: {}", path, e);
                    report.failures.push(path);
                }
                Err(e) => warn!("Directory task failed: {}", e),
            }
        }
        paths.sort();
        paths.dedup();
        report.files_found = paths.len();

        let loads = self
            .pool
            .run(paths.into_iter().map(|path| {
                let files = self.files.clone();
                move || async move {
                    files.get_file(Path::new(&path)).await;
                    let cached = files.store().files.exists(&path);
                    (path, cached)
                }
            }))
            .await;

        for load in loads {
            match load {
                Ok((_, true)) => report.files_loaded += 1,
                Ok((path, false)) => report.failures.push(path),
                Err(e) => warn!("File task failed: {}", e),
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scan complete: {} files loaded in {}ms",
            report.files_loaded, report.duration_ms
        );
        Ok(report)
    }

    /// Builds the reverse-dependency index from the cached files.
    ///
    /// Runs only when files have been scanned and the index is still
    /// empty. It does not detect staleness: clear the `indexes` namespace
    /// to rebuild.
    pub async fn index(&self) -> IndexOutcome {
        let store = self.files.store();
        if store.files.is_empty() {
            debug!("Nothing scanned, skipping index");
            return IndexOutcome::Skipped(SkipReason::NothingScanned);
        }
        if !store.indexes.is_empty() {
            debug!("Index already built, skipping");
            return IndexOutcome::Skipped(SkipReason::AlreadyIndexed);
        }

        let start = Instant::now();
        let paths = store.files.keys();
        let mut report = IndexReport {
            files_analyzed: paths.len(),
            ..IndexReport::default()
        };

        let results = self
            .pool
            .run(paths.into_iter().map(|path| {
                let extractor = Arc::clone(&self.extractor);
                let store = Arc::clone(store);
                let root = self.root.clone();
                move || async move { record_dependents(&extractor, &store, &root, &path).await }
            }))
            .await;

        for result in results {
            match result {
                Ok(0) => {}
                Ok(edges) => {
                    report.files_with_dependencies += 1;
                    report.edges += edges;
                }
                Err(e) => warn!("Index task failed: {}", e),
            }
        }

        report.entries = store.indexes.count();
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Indexing complete: {} entries from {} files in {}ms",
            report.entries, report.files_analyzed, report.duration_ms
        );
        debug!("Reverse index: {}", store.snapshot(CacheNamespace::Indexes, None));

        IndexOutcome::Indexed(report)
    }

    /// Scan followed by index.
    pub async fn run(&self) -> Result<(ScanReport, IndexOutcome)> {
        let scan = self.scan().await?;
        let index = self.index().await;
        Ok((scan, index))
    }
}

/// Appends `importer` to the reverse-index entry of each of its
/// dependencies. Returns the number of edges recorded.
async fn record_dependents(
    extractor: &ImportExtractor,
    store: &IndexStore,
    root: &Path,
    importer: &str,
) -> usize {
    let manifest = extractor.extract(Path::new(importer)).await;
    if manifest.key_count() <= 2 {
        return 0;
    }

    let importer = normalize_path(Path::new(importer));
    let mut edges = 0;
    for (_, record) in manifest.records() {
        let dependency = resolve_import_path(root, &record.resolved_path);
        store
            .indexes
            .update(dependency, |dependents| dependents.push(importer.clone()));
        edges += 1;
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdoc_core::{LocalStorage, ProjectConfig, ScanConfig};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn project() -> TempDir {
        let dir = tempdir().unwrap();
        let components = dir.path().join("components");
        let stores = dir.path().join("stores");
        fs::create_dir_all(&components).unwrap();
        fs::create_dir_all(&stores).unwrap();

        fs::write(
            components.join("Panel.vue"),
            "<template><Foo/></template>\n<script setup lang=\"ts\">\n\
             import Foo from '@/components/Foo.vue'\n\
             import { useCart } from '@/stores/cart'\n</script>",
        )
        .unwrap();
        fs::write(
            components.join("Foo.vue"),
            "<template><p>foo</p></template>",
        )
        .unwrap();
        fs::write(
            stores.join("cart.ts"),
            "import Foo from '@/components/Foo.vue'\nexport const useCart = () => Foo",
        )
        .unwrap();
        fs::write(stores.join("README.md"), "not scanned").unwrap();
        dir
    }

    fn indexer(root: &Path) -> Indexer {
        indexer_for(root, &["/components", "/stores"])
    }

    fn indexer_for(root: &Path, directories: &[&str]) -> Indexer {
        let config = ProjectConfig {
            scanning: ScanConfig {
                directories: directories.iter().map(|d| d.to_string()).collect(),
                extensions: vec![".vue".into(), ".ts".into()],
                alias: "@/".into(),
                ..ScanConfig::default()
            },
            concurrency: 2,
            ..ProjectConfig::default()
        };
        let files = FileAccess::new(Arc::new(LocalStorage), Arc::new(IndexStore::new()));
        Indexer::new(root, files, Arc::new(config))
    }

    #[tokio::test]
    async fn test_scan_loads_matching_files() {
        let dir = project();
        let indexer = indexer(dir.path());

        let report = indexer.scan().await.unwrap();

        assert_eq!(report.directories, 2);
        assert_eq!(report.files_found, 3);
        assert_eq!(report.files_loaded, 3);
        assert!(report.failures.is_empty());
        assert_eq!(indexer.store().files.count(), 3);
    }

    #[tokio::test]
    async fn test_scan_skips_missing_directories() {
        let dir = project();
        fs::remove_dir_all(dir.path().join("stores")).unwrap();
        let indexer = indexer(dir.path());

        let report = indexer.scan().await.unwrap();
        assert_eq!(report.files_loaded, 2);
    }

    #[tokio::test]
    async fn test_scan_reports_unreadable_directory() {
        let dir = project();
        fs::write(dir.path().join("broken"), "a file, not a directory").unwrap();
        let indexer = indexer_for(dir.path(), &["/components", "/broken", "/stores"]);

        let report = indexer.scan().await.unwrap();
        assert_eq!(report.directories, 3);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].ends_with("/broken"));
        assert_eq!(report.files_loaded, 3);
        assert_eq!(indexer.store().files.count(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scan_reports_directory_without_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = project();
        let stores = dir.path().join("stores");
        fs::set_permissions(&stores, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&stores).is_ok() {
            // Permissions are not enforced (running as root).
            fs::set_permissions(&stores, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        let indexer = indexer(dir.path());

        let report = indexer.scan().await.unwrap();
        fs::set_permissions(&stores, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].ends_with("/stores"));
        assert_eq!(report.files_loaded, 2);
    }

    #[tokio::test]
    async fn test_reverse_index_lists_importers() {
        let dir = project();
        let indexer = indexer(dir.path());
        indexer.scan().await.unwrap();

        let outcome = indexer.index().await;
        let report = outcome.report().unwrap();
        assert_eq!(report.files_analyzed, 3);
        assert_eq!(report.files_with_dependencies, 2);
        assert_eq!(report.edges, 3);

        let foo = indexer.directory_path("/components/Foo.vue");
        let cart = indexer.directory_path("/stores/cart.ts");
        let panel = indexer.directory_path("/components/Panel.vue");

        let mut foo_dependents = indexer.store().indexes.get(&foo).unwrap();
        foo_dependents.sort();
        let mut expected = vec![panel.clone(), cart.clone()];
        expected.sort();
        assert_eq!(foo_dependents, expected);
        assert_eq!(indexer.store().indexes.get(&cart).unwrap(), vec![panel]);
        assert_eq!(report.entries, 2);
    }

    #[tokio::test]
    async fn test_every_dependency_points_back_to_its_importer() {
        let dir = project();
        let indexer = indexer(dir.path());
        indexer.run().await.unwrap();

        for importer in indexer.store().files.keys() {
            let manifest = indexer.extractor().extract(Path::new(&importer)).await;
            for (_, record) in manifest.records() {
                let dependency = resolve_import_path(dir.path(), &record.resolved_path);
                let dependents = indexer.store().indexes.get(&dependency).unwrap();
                assert!(dependents.contains(&importer));
            }
        }
    }

    #[tokio::test]
    async fn test_index_without_scan_is_noop() {
        let dir = project();
        let indexer = indexer(dir.path());

        let outcome = indexer.index().await;
        assert!(matches!(outcome, IndexOutcome::Skipped(SkipReason::NothingScanned)));
        assert!(indexer.store().indexes.is_empty());
    }

    #[tokio::test]
    async fn test_index_runs_once() {
        let dir = project();
        let indexer = indexer(dir.path());
        indexer.scan().await.unwrap();
        indexer.store().indexes.add("/sentinel", vec!["x".to_string()]);

        let outcome = indexer.index().await;
        assert!(matches!(outcome, IndexOutcome::Skipped(SkipReason::AlreadyIndexed)));
        assert_eq!(indexer.store().indexes.count(), 1);
        assert_eq!(indexer.store().indexes.get("/sentinel").unwrap(), vec!["x"]);
    }
}
