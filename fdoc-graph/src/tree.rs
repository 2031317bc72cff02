//! Forward and reverse dependency trees.
//!
//! The forward tree answers "what does this file depend on": the root is
//! the file itself, its children are one section per dependency category,
//! and every dependency under a section is expanded recursively. The
//! cohesion tree answers "what depends on this file" one level deep.
//!
//! Both carry layout hints (`x`, `y`) for the diagram front-end.

use crate::error::{GraphError, Result};
use fdoc_core::{
    file_name, normalize_path, require_project_root, resolve_import_path, FileImportManifest,
    ImportExtractor,
};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

pub const HORIZONTAL_SPACING: i64 = 100;
pub const VERTICAL_SPACING: i64 = 60;
const ORIGIN: i64 = 10;

/// One node of a dependency diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeItem {
    pub id: String,
    pub name: String,
    /// Empty for category sections.
    pub path: String,
    pub title: String,
    pub x: i64,
    pub y: i64,
    pub children: Vec<TreeItem>,
    /// Set on a file that already appears higher up the same branch. Its
    /// dependencies are not expanded again.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cyclic: bool,
}

impl TreeItem {
    fn leaf(id: String, name: String, path: String, title: String, x: i64, y: i64) -> Self {
        Self {
            id,
            name,
            path,
            title,
            x,
            y,
            children: Vec::new(),
            cyclic: false,
        }
    }

    /// Total number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeItem::size).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeItem::depth).max().unwrap_or(0)
    }
}

/// Builds trees for the files of one project.
pub struct TreeBuilder {
    root: PathBuf,
    extractor: Arc<ImportExtractor>,
}

type BoxedTree<'a> = Pin<Box<dyn Future<Output = TreeItem> + Send + 'a>>;

impl TreeBuilder {
    /// Fails with `ConfigurationMissing` when `root` is not a directory.
    pub fn new(root: &Path, extractor: Arc<ImportExtractor>) -> Result<Self> {
        Ok(Self {
            root: require_project_root(root)?,
            extractor,
        })
    }

    /// The forward dependency tree of `path`.
    pub async fn dependency_tree(&self, path: &Path) -> Result<TreeItem> {
        if path.as_os_str().is_empty() {
            return Err(GraphError::EmptyPath);
        }

        let manifest = self.extractor.extract(path).await;
        let root_name = manifest.file_name.clone();
        let mut branch = HashSet::new();
        let tree = self
            .expand(manifest, String::new(), ORIGIN, ORIGIN, &root_name, &mut branch)
            .await;

        debug!("Dependency tree of {}: {} nodes", path.display(), tree.size());
        Ok(tree)
    }

    fn expand<'a>(
        &'a self,
        manifest: Arc<FileImportManifest>,
        title: String,
        x: i64,
        y: i64,
        root_name: &'a str,
        branch: &'a mut HashSet<String>,
    ) -> BoxedTree<'a> {
        Box::pin(async move {
            let title = if title.is_empty() {
                manifest.file_name.clone()
            } else {
                title
            };
            let mut item = TreeItem::leaf(
                format!("{}_{}", root_name, manifest.file_name),
                manifest.file_name.clone(),
                manifest.file_path.clone(),
                title,
                x,
                y,
            );

            let key = normalize_path(Path::new(&manifest.file_path));
            if !branch.insert(key.clone()) {
                item.cyclic = true;
                return item;
            }

            let mut section_index = 0;
            for (category, dependencies) in &manifest.categories {
                if dependencies.is_empty() {
                    continue;
                }

                let mut section = TreeItem::leaf(
                    format!("{}_{}_{}", root_name, manifest.file_name, category),
                    category.to_string(),
                    String::new(),
                    category.to_string(),
                    x + section_index * HORIZONTAL_SPACING,
                    y,
                );

                for (child_index, (local_name, dependency)) in dependencies.iter().enumerate() {
                    let child_path = resolve_import_path(&self.root, dependency);
                    let child_manifest = self.extractor.extract(Path::new(&child_path)).await;
                    let child = self
                        .expand(
                            child_manifest,
                            local_name.clone(),
                            section.x + child_index as i64 * HORIZONTAL_SPACING,
                            section.y + VERTICAL_SPACING,
                            root_name,
                            branch,
                        )
                        .await;
                    section.children.push(child);
                }

                item.children.push(section);
                section_index += 1;
            }

            branch.remove(&key);
            item
        })
    }

    /// The cohesion tree of `path`, with importers read from the reverse
    /// index. A file nobody imports gets a root without children.
    pub fn cohesion_tree_from_index(&self, path: &Path) -> Result<TreeItem> {
        if path.as_os_str().is_empty() {
            return Err(GraphError::EmptyPath);
        }

        let key = normalize_path(path);
        let importers = match self.extractor.files().store().indexes.get(&key) {
            Some(importers) => importers,
            None => {
                warn!("No dependents indexed for {}", key);
                Vec::new()
            }
        };
        Ok(cohesion_tree(path, &importers))
    }
}

/// Builds a one-level cohesion tree. Pure: reads nothing from disk.
pub fn cohesion_tree(path: &Path, importers: &[String]) -> TreeItem {
    let name = file_name(path);
    let mut root = TreeItem::leaf(
        format!("Cohesion_{}", name),
        name.clone(),
        path.to_string_lossy().into_owned(),
        name,
        ORIGIN,
        ORIGIN,
    );

    for (i, importer) in importers.iter().enumerate() {
        let child_name = file_name(Path::new(importer));
        root.children.push(TreeItem::leaf(
            format!("Cohesion_{}", child_name),
            child_name.clone(),
            importer.clone(),
            child_name,
            ORIGIN + (i as i64 + 1) * HORIZONTAL_SPACING,
            ORIGIN + VERTICAL_SPACING,
        ));
    }

    root
}
