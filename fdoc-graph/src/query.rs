//! Query result types.
//!
//! Everything here serializes to the JSON that `fdoc export` and
//! `fdoc status --json` print.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub files: usize,
    pub imports: usize,
    pub cycles: usize,
}

/// A file and its position in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    /// Number of files it imports.
    pub dependencies: usize,
    /// Number of files importing it.
    pub dependents: usize,
    pub centrality: f64,
}

/// One importer -> dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub from: String,
    pub to: String,
}

/// A frequently imported file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub path: String,
    pub name: String,
    pub dependents: usize,
    pub centrality: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub stats: GraphStats,
    pub files: Vec<FileInfo>,
    pub imports: Vec<EdgeInfo>,
    pub cycles: Vec<Vec<String>>,
}
