//! Incremental graph construction

use std::collections::HashMap;

use crate::graph::Graph;

/// Builder for incrementally constructing a [`Graph`] from an edge stream.
///
/// Self-loops and duplicate edges are dropped so the built graph satisfies
/// the simple-graph invariants without a separate cleanup pass.
pub struct GraphBuilder {
    /// Mapping from external ids to node indices
    node_map: HashMap<u64, u32>,

    /// External node ids in insertion order
    id_map: Vec<u64>,

    /// Adjacency lists for each node
    adjacency: Vec<Vec<u32>>,

    /// Undirected edge count (each edge counted once)
    num_edges: usize,

    /// Edges dropped as self-loops or duplicates
    dropped: usize,
}

impl GraphBuilder {
    /// Create a new graph builder with the given node capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            node_map: HashMap::with_capacity(capacity),
            id_map: Vec::with_capacity(capacity),
            adjacency: Vec::with_capacity(capacity),
            num_edges: 0,
            dropped: 0,
        }
    }

    /// Get or create the internal id for an external node id
    pub fn get_or_create_node(&mut self, external: u64) -> u32 {
        if let Some(&idx) = self.node_map.get(&external) {
            return idx;
        }

        let idx = self.id_map.len() as u32;
        self.node_map.insert(external, idx);
        self.id_map.push(external);
        self.adjacency.push(Vec::new());

        idx
    }

    /// Add an undirected edge between two external ids.
    ///
    /// Returns false when the edge was dropped as a self-loop or duplicate.
    pub fn add_edge(&mut self, a: u64, b: u64) -> bool {
        if a == b {
            self.dropped += 1;
            return false;
        }

        let u = self.get_or_create_node(a);
        let v = self.get_or_create_node(b);

        if self.adjacency[u as usize].contains(&v) {
            self.dropped += 1;
            return false;
        }

        self.adjacency[u as usize].push(v);
        self.adjacency[v as usize].push(u);
        self.num_edges += 1;

        true
    }

    /// Number of edges dropped so far
    pub fn dropped_edges(&self) -> usize {
        self.dropped
    }

    /// Build the graph
    pub fn build(self) -> Graph {
        Graph::from_parts(self.adjacency, self.id_map, self.num_edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_and_drops_self_loops() {
        let mut builder = GraphBuilder::with_capacity(4);
        assert!(builder.add_edge(1, 2));
        assert!(!builder.add_edge(2, 1));
        assert!(!builder.add_edge(1, 1));
        assert!(builder.add_edge(2, 3));
        assert_eq!(builder.dropped_edges(), 2);

        let g = builder.build();
        assert_eq!(g.num_nodes, 3);
        assert_eq!(g.num_edges, 2);
        assert_eq!(g.degree(g.internal_id(2).unwrap()), 2);
    }

    #[test]
    fn internal_ids_follow_first_appearance() {
        let mut builder = GraphBuilder::with_capacity(4);
        builder.add_edge(42, 7);
        builder.add_edge(7, 99);

        let g = builder.build();
        assert_eq!(g.id_map, vec![42, 7, 99]);
    }
}
