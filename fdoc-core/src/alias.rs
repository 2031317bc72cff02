//! Alias resolution.
//!
//! Aliased imports (`@/components/Foo.vue`) are rewritten to
//! project-relative paths (`../components/Foo.vue`) and filed under the
//! category named by their first directory, but only when that directory
//! is one of the watched ones. Unaliased imports (packages, relative
//! paths) are ignored.

use crate::config::ScanConfig;
use crate::parser::{ImportDeclaration, ImportSpecifier};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Marker standing for the project root in resolved import paths.
pub const ROOT_MARKER: &str = "..";

/// A dependency bucket, named after the top-level directory of the
/// resolved import (`components`, `stores`, ...).
///
/// Only the resolver creates categories, so every category in a manifest
/// corresponds to a watched directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DependencyCategory(String);

impl DependencyCategory {
    fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DependencyCategory {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Category -> (local name -> resolved path).
pub type CategoryMap = BTreeMap<DependencyCategory, BTreeMap<String, String>>;

/// Resolves aliased import sources against one scan configuration.
#[derive(Debug, Clone)]
pub struct AliasResolver {
    alias: String,
    directories: Vec<String>,
    extensions: Vec<String>,
    default_extension: String,
}

impl AliasResolver {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            alias: config.alias.clone(),
            directories: config
                .directories
                .iter()
                .map(|d| d.trim_matches('/').to_string())
                .filter(|d| !d.is_empty())
                .collect(),
            extensions: config.normalized_extensions(),
            default_extension: config.normalized_default_extension(),
        }
    }

    /// Resolves an import source to its category and project-relative path.
    ///
    /// Returns `None` for unaliased sources and for unwatched directories.
    /// An empty alias matches nothing.
    pub fn resolve_source(&self, source: &str) -> Option<(DependencyCategory, String)> {
        if self.alias.is_empty() {
            return None;
        }
        let rest = source.strip_prefix(self.alias.as_str())?;
        let rest = rest.trim_start_matches('/');

        let mut resolved = format!("{}/{}", ROOT_MARKER, rest);
        if !self.extensions.iter().any(|ext| resolved.ends_with(ext.as_str())) {
            resolved.push_str(&self.default_extension);
        }

        let segment = resolved.split('/').nth(1).filter(|s| !s.is_empty())?;
        if !self.directories.iter().any(|dir| dir == segment) {
            return None;
        }

        Some((DependencyCategory::new(segment), resolved))
    }

    /// Records the bindings of one import declaration into `categories`.
    ///
    /// Default and named bindings are recorded; namespace imports are not.
    /// A declaration that binds nothing leaves `categories` untouched.
    pub fn apply(&self, declaration: &ImportDeclaration, categories: &mut CategoryMap) {
        let Some((category, resolved)) = self.resolve_source(&declaration.source) else {
            return;
        };

        for specifier in &declaration.specifiers {
            match specifier {
                ImportSpecifier::Default { local } | ImportSpecifier::Named { local, .. } => {
                    categories
                        .entry(category.clone())
                        .or_default()
                        .insert(local.clone(), resolved.clone());
                }
                ImportSpecifier::Namespace { .. } => {}
            }
        }
    }
}
