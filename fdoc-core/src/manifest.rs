//! Per-file import manifests.
//!
//! A manifest records the outbound, aliased dependencies of one source
//! file, grouped by category. It serializes flat, the way the diagram
//! front-end expects it:
//!
//! ```json
//! { "fileName": "Panel.vue", "filePath": "/p/components/Panel.vue",
//!   "components": { "Foo": "../components/Foo.vue" } }
//! ```

use crate::alias::{CategoryMap, DependencyCategory};
use crate::fs::file_name;
use serde::Serialize;
use std::path::Path;

/// One resolved import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub local_name: String,
    pub resolved_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImportManifest {
    pub file_name: String,
    pub file_path: String,
    #[serde(flatten)]
    pub categories: CategoryMap,
}

impl FileImportManifest {
    /// A manifest with no categories.
    pub fn empty(path: &Path) -> Self {
        Self {
            file_name: file_name(path),
            file_path: path.to_string_lossy().into_owned(),
            categories: CategoryMap::new(),
        }
    }

    pub fn with_categories(path: &Path, categories: CategoryMap) -> Self {
        Self {
            categories,
            ..Self::empty(path)
        }
    }

    /// Number of top-level keys when serialized: name, path and one per category.
    pub fn key_count(&self) -> usize {
        2 + self.categories.len()
    }

    /// False for name/path-only manifests.
    pub fn has_dependencies(&self) -> bool {
        self.key_count() > 2
    }

    pub fn category(&self, name: &str) -> Option<&std::collections::BTreeMap<String, String>> {
        self.categories
            .iter()
            .find(|(category, _)| category.as_str() == name)
            .map(|(_, bindings)| bindings)
    }

    /// Every import, with the category it was filed under.
    pub fn records(&self) -> impl Iterator<Item = (&DependencyCategory, ImportRecord)> + '_ {
        self.categories.iter().flat_map(|(category, bindings)| {
            bindings.iter().map(move |(local, resolved)| {
                (
                    category,
                    ImportRecord {
                        local_name: local.clone(),
                        resolved_path: resolved.clone(),
                    },
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasResolver;
    use crate::config::ScanConfig;
    use crate::parser::parse_imports;

    fn categories() -> CategoryMap {
        let resolver = AliasResolver::new(&ScanConfig {
            directories: vec!["/components".into()],
            extensions: vec![".vue".into()],
            alias: "@/".into(),
            ..ScanConfig::default()
        });
        let mut categories = CategoryMap::new();
        for decl in parse_imports("import Foo from '@/components/Foo.vue'").unwrap() {
            resolver.apply(&decl, &mut categories);
        }
        categories
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = FileImportManifest::empty(Path::new("/p/components/Panel.vue"));
        assert_eq!(manifest.file_name, "Panel.vue");
        assert_eq!(manifest.key_count(), 2);
        assert!(!manifest.has_dependencies());
    }

    #[test]
    fn test_manifest_serializes_flat() {
        let manifest =
            FileImportManifest::with_categories(Path::new("/p/components/Panel.vue"), categories());
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(json["fileName"], "Panel.vue");
        assert_eq!(json["filePath"], "/p/components/Panel.vue");
        assert_eq!(json["components"]["Foo"], "../components/Foo.vue");
        assert_eq!(manifest.key_count(), 3);
    }

    #[test]
    fn test_records() {
        let manifest =
            FileImportManifest::with_categories(Path::new("/p/components/Panel.vue"), categories());
        let records: Vec<_> = manifest.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0.as_str(), "components");
        assert_eq!(records[0].1.local_name, "Foo");
        assert!(manifest.category("components").is_some());
        assert!(manifest.category("stores").is_none());
    }
}
