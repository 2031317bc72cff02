//! fdoc Graph - dependency trees and the project import graph
//!
//! Two kinds of answers are built here on top of `fdoc-core`:
//!
//! - [`TreeBuilder`] produces the diagram trees: the forward dependency
//!   tree of one file and its cohesion (reverse) tree.
//! - [`DependencyGraph`] is a petgraph view of the whole reverse index,
//!   used for dependents queries, hotspot ranking, cycle detection and
//!   JSON export.

pub mod builder;
pub mod error;
pub mod graph;
pub mod query;
pub mod ranking;
pub mod tree;

pub use builder::GraphBuilder;
pub use error::{GraphError, Result};
pub use graph::{DependencyGraph, FileNode, NodeId};
pub use query::{EdgeInfo, FileInfo, GraphExport, GraphStats, Hotspot};
pub use ranking::{compute_centrality, CentralityScores};
pub use tree::{cohesion_tree, TreeBuilder, TreeItem};
