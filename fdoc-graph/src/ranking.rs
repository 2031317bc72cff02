//! Centrality ranking for files.
//!
//! A simplified PageRank over the import graph: files imported by many
//! (and by well-imported) files rank higher. Used to break ties between
//! hotspots with the same number of importers.

use crate::graph::{DependencyGraph, NodeId};
use std::collections::HashMap;

/// Stores centrality scores after computation.
#[derive(Debug, Default)]
pub struct CentralityScores {
    scores: HashMap<NodeId, f64>,
}

impl CentralityScores {
    /// Gets the score for a node.
    pub fn get(&self, id: NodeId) -> f64 {
        self.scores.get(&id).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Computes centrality scores for all files in the graph, normalized to
/// `[0, 1]`.
///
/// * `iterations` - 10-20 is usually enough
/// * `damping` - 0.85 is standard
pub fn compute_centrality(
    graph: &DependencyGraph,
    iterations: usize,
    damping: f64,
) -> CentralityScores {
    let node_count = graph.node_count();
    if node_count == 0 {
        return CentralityScores::default();
    }

    let initial_score = 1.0 / node_count as f64;
    let mut scores: HashMap<NodeId, f64> = graph
        .node_indexes()
        .map(|idx| (idx, initial_score))
        .collect();

    let out_degree: HashMap<NodeId, usize> = graph
        .node_indexes()
        .map(|idx| (idx, graph.imports_of(idx).len().max(1)))
        .collect();

    for _ in 0..iterations {
        let base = (1.0 - damping) / node_count as f64;
        let mut new_scores: HashMap<NodeId, f64> = HashMap::with_capacity(node_count);

        for idx in graph.node_indexes() {
            let incoming: f64 = graph
                .importers_of(idx)
                .iter()
                .filter_map(|importer| {
                    let score = scores.get(importer)?;
                    let out = *out_degree.get(importer)? as f64;
                    Some(score / out)
                })
                .sum();

            new_scores.insert(idx, base + damping * incoming);
        }

        scores = new_scores;
    }

    let max_score = scores.values().cloned().fold(0.0f64, f64::max);
    if max_score > 0.0 {
        for score in scores.values_mut() {
            *score /= max_score;
        }
    }

    CentralityScores { scores }
}
