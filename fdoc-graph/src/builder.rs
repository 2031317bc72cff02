//! Graph builder.
//!
//! Turns the contents of an [`IndexStore`] into a [`DependencyGraph`]:
//! every scanned file becomes a node, and every reverse-index entry
//! `dependency -> [importers]` becomes edges `importer -> dependency`.

use crate::graph::DependencyGraph;
use fdoc_core::IndexStore;
use std::collections::BTreeMap;

pub struct GraphBuilder {
    graph: DependencyGraph,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
        }
    }

    /// Adds files without edges, so files that import nothing and are
    /// imported by nothing still show up.
    pub fn add_files<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.graph.add_file(path.as_ref());
        }
        self
    }

    /// Adds the edges of a reverse index.
    pub fn add_reverse_index(&mut self, index: &BTreeMap<String, Vec<String>>) -> &mut Self {
        for (dependency, importers) in index {
            for importer in importers {
                self.graph.add_import(importer, dependency);
            }
        }
        self
    }

    pub fn build(self) -> DependencyGraph {
        self.graph
    }

    /// Graph of everything currently in `store`.
    pub fn from_store(store: &IndexStore) -> DependencyGraph {
        let mut builder = Self::new();
        builder
            .add_files(store.files.keys())
            .add_reverse_index(&store.indexes.all());
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_adds_isolated_files() {
        let mut builder = GraphBuilder::new();
        builder.add_files(["/p/a.ts", "/p/b.ts", "/p/a.ts"]);
        let graph = builder.build();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_from_store_reverses_index_entries() {
        let store = IndexStore::new();
        store.files.add("/p/components/Panel.vue", String::new());
        store.files.add("/p/components/Foo.vue", String::new());
        store.files.add("/p/components/Lonely.vue", String::new());
        store.indexes.add(
            "/p/components/Foo.vue",
            vec![
                "/p/components/Panel.vue".to_string(),
                "/p/components/Panel.vue".to_string(),
            ],
        );

        let graph = GraphBuilder::from_store(&store);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.dependencies("/p/components/Panel.vue"),
            vec!["/p/components/Foo.vue"]
        );
        assert!(graph.contains("/p/components/Lonely.vue"));
    }
}
