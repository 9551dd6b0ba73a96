//! Dependency graph: reverse edges from a source cell to the formula cells
//! that look it up.
//!
//! Edge direction: `A -> B` means "B's formula reads A". Each dependent has at
//! most one live edge, since a lookup formula names exactly one source.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::types::CellKey;

/// Source key -> set of dependent keys, with set semantics per source.
///
/// Ordered collections keep traversal deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    dependents: BTreeMap<CellKey, BTreeSet<CellKey>>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` reads `source`. Returns false if already present.
    pub fn add_edge(&mut self, source: CellKey, dependent: CellKey) -> bool {
        self.dependents.entry(source).or_default().insert(dependent)
    }

    /// Drop the edge `source -> dependent`; empty sets are removed, not stored.
    pub fn remove_edge(&mut self, source: &CellKey, dependent: &CellKey) -> bool {
        let Some(set) = self.dependents.get_mut(source) else {
            return false;
        };
        let removed = set.remove(dependent);
        if set.is_empty() {
            self.dependents.remove(source);
        }
        removed
    }

    pub fn has_edge(&self, source: &CellKey, dependent: &CellKey) -> bool {
        self.dependents
            .get(source)
            .is_some_and(|set| set.contains(dependent))
    }

    /// Direct dependents of `source`
    pub fn dependents(&self, source: &CellKey) -> impl Iterator<Item = &CellKey> + '_ {
        self.dependents.get(source).into_iter().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Lift the edges into a petgraph directed graph
    pub fn to_digraph(&self) -> (DiGraph<CellKey, ()>, HashMap<CellKey, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut node_indices: HashMap<CellKey, NodeIndex> = HashMap::new();

        let mut node = |graph: &mut DiGraph<CellKey, ()>, key: &CellKey| -> NodeIndex {
            *node_indices
                .entry(key.clone())
                .or_insert_with(|| graph.add_node(key.clone()))
        };

        for (source, dependents) in &self.dependents {
            let from = node(&mut graph, source);
            for dependent in dependents {
                let to = node(&mut graph, dependent);
                graph.add_edge(from, to, ());
            }
        }

        (graph, node_indices)
    }

    /// Every key reachable from `start` along dependency edges, breadth-first,
    /// excluding `start` itself
    pub fn transitive_dependents(&self, start: &CellKey) -> Vec<CellKey> {
        let (graph, node_indices) = self.to_digraph();
        let Some(&start_idx) = node_indices.get(start) else {
            return Vec::new();
        };

        let mut bfs = Bfs::new(&graph, start_idx);
        let mut reached = Vec::new();
        while let Some(idx) = bfs.next(&graph) {
            if idx != start_idx {
                reached.push(graph[idx].clone());
            }
        }
        reached
    }
}
