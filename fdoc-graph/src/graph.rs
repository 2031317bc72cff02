//! Project-wide import graph.
//!
//! Nodes are files (normalized absolute paths), edges point from the
//! importing file to its dependency. The graph is a read-only view built
//! from the reverse index; see [`GraphBuilder`](crate::GraphBuilder).

use crate::query::{EdgeInfo, FileInfo, GraphExport, GraphStats, Hotspot};
use crate::ranking::compute_centrality;
use fdoc_core::file_name;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub type NodeId = NodeIndex;

/// A file in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub path: String,
    pub name: String,
}

impl FileNode {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name(Path::new(&path)),
            path,
        }
    }
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<FileNode, ()>,
    by_path: HashMap<String, NodeId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, returning the existing node when already present.
    pub fn add_file(&mut self, path: &str) -> NodeId {
        if let Some(&id) = self.by_path.get(path) {
            return id;
        }
        let id = self.graph.add_node(FileNode::new(path));
        self.by_path.insert(path.to_string(), id);
        id
    }

    /// Records that `importer` imports `dependency`. Repeated imports of the
    /// same pair collapse into one edge.
    pub fn add_import(&mut self, importer: &str, dependency: &str) {
        let from = self.add_file(importer);
        let to = self.add_file(dependency);
        self.graph.update_edge(from, to, ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn get_index(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, id: NodeId) -> Option<&FileNode> {
        self.graph.node_weight(id)
    }

    pub fn node_indexes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Files that `id` imports.
    pub fn imports_of(&self, id: NodeId) -> Vec<NodeId> {
        self.graph.neighbors_directed(id, Direction::Outgoing).collect()
    }

    /// Files that import `id`.
    pub fn importers_of(&self, id: NodeId) -> Vec<NodeId> {
        self.graph.neighbors_directed(id, Direction::Incoming).collect()
    }

    /// Paths `path` depends on, sorted.
    pub fn dependencies(&self, path: &str) -> Vec<String> {
        self.paths(self.get_index(path).map(|id| self.imports_of(id)))
    }

    /// Paths of the files importing `path`, sorted.
    pub fn dependents(&self, path: &str) -> Vec<String> {
        self.paths(self.get_index(path).map(|id| self.importers_of(id)))
    }

    fn paths(&self, ids: Option<Vec<NodeId>>) -> Vec<String> {
        let mut paths: Vec<String> = ids
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.get(id).map(|node| node.path.clone()))
            .collect();
        paths.sort();
        paths
    }

    /// Import cycles: groups of files that reach each other, plus files
    /// importing themselves. Each group is sorted; groups are ordered by
    /// their first path.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .map_or(false, |&id| self.graph.find_edge(id, id).is_some())
            })
            .map(|component| {
                let mut paths: Vec<String> = component
                    .into_iter()
                    .filter_map(|id| self.get(id).map(|node| node.path.clone()))
                    .collect();
                paths.sort();
                paths
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// The `limit` most imported files, by number of importers and then by
    /// centrality. Files nobody imports are not hotspots.
    pub fn hotspots(&self, limit: usize) -> Vec<Hotspot> {
        let scores = compute_centrality(self, 20, 0.85);
        let mut hotspots: Vec<Hotspot> = self
            .node_indexes()
            .filter_map(|id| {
                let node = self.get(id)?;
                let dependents = self.importers_of(id).len();
                (dependents > 0).then(|| Hotspot {
                    path: node.path.clone(),
                    name: node.name.clone(),
                    dependents,
                    centrality: scores.get(id),
                })
            })
            .collect();

        hotspots.sort_by(|a, b| {
            b.dependents
                .cmp(&a.dependents)
                .then(b.centrality.total_cmp(&a.centrality))
                .then(a.path.cmp(&b.path))
        });
        hotspots.truncate(limit);
        hotspots
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            files: self.node_count(),
            imports: self.edge_count(),
            cycles: self.cycles().len(),
        }
    }

    /// Serializable snapshot of the whole graph.
    pub fn export(&self) -> GraphExport {
        let scores = compute_centrality(self, 20, 0.85);

        let mut files: Vec<FileInfo> = self
            .node_indexes()
            .filter_map(|id| {
                let node = self.get(id)?;
                Some(FileInfo {
                    path: node.path.clone(),
                    name: node.name.clone(),
                    dependencies: self.imports_of(id).len(),
                    dependents: self.importers_of(id).len(),
                    centrality: scores.get(id),
                })
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let mut imports: Vec<EdgeInfo> = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                Some(EdgeInfo {
                    from: self.get(edge.source())?.path.clone(),
                    to: self.get(edge.target())?.path.clone(),
                })
            })
            .collect();
        imports.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

        GraphExport {
            stats: self.stats(),
            files,
            imports,
            cycles: self.cycles(),
        }
    }
}
