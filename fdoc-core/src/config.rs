//! Project configuration.
//!
//! Configuration lives in `<root>/.fdoc/config.json`. Every section is
//! optional and falls back to defaults, so a project without a config file
//! simply scans nothing and loads no mocks.
//!
//! Consumers never cache the loaded values: the alias resolver and the
//! sandbox ask the [`ConfigSource`] again on every call, which lets the
//! configuration change while the process is running.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory (relative to the project root) holding fdoc's own files.
pub const CONFIG_DIR: &str = ".fdoc";

/// Name of the configuration file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Default number of in-flight tasks in the scan and index phases.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// What to scan and how to resolve aliased imports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// Root-relative directories, written with a leading slash (`/components`).
    pub directories: Vec<String>,

    /// File extensions to include, e.g. `.vue`. Empty means "everything".
    pub extensions: Vec<String>,

    /// Import prefix standing for the project root, e.g. `@/`.
    pub alias: String,

    /// Appended to aliased imports that carry none of `extensions`.
    pub default_extension: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            extensions: Vec::new(),
            alias: String::new(),
            default_extension: ".ts".to_string(),
        }
    }
}

impl ScanConfig {
    /// Configured extensions in dotted form (`vue` and `.vue` both become `.vue`).
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions.iter().map(|e| dotted(e)).collect()
    }

    pub fn normalized_default_extension(&self) -> String {
        dotted(&self.default_extension)
    }
}

fn dotted(ext: &str) -> String {
    if ext.starts_with('.') || ext.is_empty() {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

/// Limits applied to every sandbox invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxSettings {
    /// JavaScript runtime executable.
    pub runtime: String,
    pub parse_timeout_ms: u64,
    pub execution_timeout_ms: u64,
    pub max_memory_mb: u32,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            runtime: "node".to_string(),
            parse_timeout_ms: 1000,
            execution_timeout_ms: 5000,
            max_memory_mb: 256,
        }
    }
}

/// The full contents of `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub scanning: ScanConfig,

    /// Mock name -> root-relative path of a `.json` or `.js` file.
    pub vm_context_mocks: BTreeMap<String, String>,

    /// Documentation name -> root-relative markdown path.
    pub docs: BTreeMap<String, String>,

    pub sandbox: SandboxSettings,

    pub concurrency: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            scanning: ScanConfig::default(),
            vm_context_mocks: BTreeMap::new(),
            docs: BTreeMap::new(),
            sandbox: SandboxSettings::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Where configuration comes from.
pub trait ConfigSource: Send + Sync {
    fn load_scanning_config(&self) -> Result<ScanConfig>;

    fn load_mock_bindings(&self) -> Result<BTreeMap<String, String>>;

    fn load_docs_mapping(&self) -> Result<BTreeMap<String, String>>;

    fn load_sandbox_settings(&self) -> Result<SandboxSettings>;

    /// Bounded-pool size for scanning and indexing.
    fn concurrency(&self) -> usize {
        DEFAULT_CONCURRENCY
    }
}

/// An already-loaded configuration is its own source.
impl ConfigSource for ProjectConfig {
    fn load_scanning_config(&self) -> Result<ScanConfig> {
        Ok(self.scanning.clone())
    }

    fn load_mock_bindings(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.vm_context_mocks.clone())
    }

    fn load_docs_mapping(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.docs.clone())
    }

    fn load_sandbox_settings(&self) -> Result<SandboxSettings> {
        Ok(self.sandbox.clone())
    }

    fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Reads `config.json` from disk on every call.
#[derive(Debug, Clone)]
pub struct JsonConfigSource {
    path: PathBuf,
}

impl JsonConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The config file of a project root.
    pub fn for_project(root: &Path) -> Self {
        Self::new(root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the whole file. A missing file yields the defaults.
    pub fn load(&self) -> Result<ProjectConfig> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| CoreError::Config {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProjectConfig::default()),
            Err(e) => Err(CoreError::io(&self.path, e)),
        }
    }
}

impl ConfigSource for JsonConfigSource {
    fn load_scanning_config(&self) -> Result<ScanConfig> {
        Ok(self.load()?.scanning)
    }

    fn load_mock_bindings(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.load()?.vm_context_mocks)
    }

    fn load_docs_mapping(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.load()?.docs)
    }

    fn load_sandbox_settings(&self) -> Result<SandboxSettings> {
        Ok(self.load()?.sandbox)
    }

    fn concurrency(&self) -> usize {
        self.load()
            .map(|config| config.concurrency.max(1))
            .unwrap_or(DEFAULT_CONCURRENCY)
    }
}

/// Checks that `root` is usable as a project root.
pub fn require_project_root(root: &Path) -> Result<PathBuf> {
    if root.as_os_str().is_empty() || !root.is_dir() {
        return Err(CoreError::ConfigurationMissing(root.to_path_buf()));
    }
    Ok(root.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let source = JsonConfigSource::for_project(dir.path());

        let scanning = source.load_scanning_config().unwrap();
        assert!(scanning.directories.is_empty());
        assert_eq!(scanning.default_extension, ".ts");
        assert_eq!(source.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(source.load_sandbox_settings().unwrap().parse_timeout_ms, 1000);
    }

    #[test]
    fn test_config_is_read_fresh() {
        let dir = tempdir().unwrap();
        let source = JsonConfigSource::for_project(dir.path());
        fs::create_dir_all(dir.path().join(CONFIG_DIR)).unwrap();

        fs::write(
            source.path(),
            r#"{ "scanning": { "directories": ["/components"], "alias": "@/" } }"#,
        )
        .unwrap();
        assert_eq!(source.load_scanning_config().unwrap().alias, "@/");

        fs::write(source.path(), r#"{ "scanning": { "alias": "~/" } }"#).unwrap();
        assert_eq!(source.load_scanning_config().unwrap().alias, "~/");
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = tempdir().unwrap();
        let source = JsonConfigSource::for_project(dir.path());
        fs::create_dir_all(dir.path().join(CONFIG_DIR)).unwrap();
        fs::write(source.path(), "{ not json").unwrap();

        assert!(matches!(
            source.load_scanning_config(),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn test_extensions_are_dotted() {
        let config = ScanConfig {
            extensions: vec!["vue".into(), ".ts".into()],
            default_extension: "js".into(),
            ..ScanConfig::default()
        };
        assert_eq!(config.normalized_extensions(), vec![".vue", ".ts"]);
        assert_eq!(config.normalized_default_extension(), ".js");
    }

    #[test]
    fn test_require_project_root() {
        let dir = tempdir().unwrap();
        assert!(require_project_root(dir.path()).is_ok());
        assert!(matches!(
            require_project_root(&dir.path().join("missing")),
            Err(CoreError::ConfigurationMissing(_))
        ));
    }
}
