//! Mutable graph store with external id mapping

use std::collections::HashMap;
use std::mem;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Undirected simple graph over dense internal ids `0..num_nodes`.
///
/// External 64-bit node ids are kept in `id_map` (internal -> external) with
/// `node_map` as its inverse. Each undirected edge is stored in both
/// endpoints' adjacency lists and counted once in `num_edges`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Number of nodes in the graph
    pub num_nodes: usize,

    /// Number of undirected edges (each counted once)
    pub num_edges: usize,

    /// Adjacency list per internal node id
    adjacency: Vec<Vec<u32>>,

    /// Mapping from internal node ids to external ids
    pub id_map: Vec<u64>,

    /// Mapping from external ids back to internal node ids
    pub node_map: HashMap<u64, u32>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph from prebuilt parts. The adjacency lists must
    /// already be symmetric, self-loop free and duplicate free.
    pub(crate) fn from_parts(adjacency: Vec<Vec<u32>>, id_map: Vec<u64>, num_edges: usize) -> Self {
        let node_map = id_map
            .iter()
            .enumerate()
            .map(|(idx, &ext)| (ext, idx as u32))
            .collect();

        Self {
            num_nodes: id_map.len(),
            num_edges,
            adjacency,
            id_map,
            node_map,
        }
    }

    /// Get the degree of a node
    pub fn degree(&self, node: u32) -> u32 {
        self.adjacency[node as usize].len() as u32
    }

    /// Get the neighbors of a node
    pub fn neighbors(&self, node: u32) -> &[u32] {
        &self.adjacency[node as usize]
    }

    /// Look up the internal id for an external node id
    pub fn internal_id(&self, external: u64) -> Option<u32> {
        self.node_map.get(&external).copied()
    }

    /// Look up the external id for an internal node id
    pub fn external_id(&self, node: u32) -> u64 {
        self.id_map[node as usize]
    }

    /// Check whether an external node id is present
    pub fn contains(&self, external: u64) -> bool {
        self.node_map.contains_key(&external)
    }

    /// Check whether the undirected edge {u, v} is present
    pub fn has_edge(&self, u: u32, v: u32) -> bool {
        self.adjacency[u as usize].contains(&v)
    }

    /// Append an isolated node with the given external id
    pub fn add_node(&mut self, external: u64) -> Result<u32> {
        if self.node_map.contains_key(&external) {
            bail!("node {} already exists in the graph", external);
        }

        let internal = self.num_nodes as u32;
        self.adjacency.push(Vec::new());
        self.id_map.push(external);
        self.node_map.insert(external, internal);
        self.num_nodes += 1;

        Ok(internal)
    }

    /// Append a batch of undirected edges given as internal id pairs.
    ///
    /// Self-loops and pairs that are already present are skipped. Returns
    /// the number of edges actually inserted.
    pub fn add_edges(&mut self, edges: &[(u32, u32)]) -> usize {
        let mut inserted = 0;

        for &(u, v) in edges {
            if u == v || self.has_edge(u, v) {
                continue;
            }

            self.adjacency[u as usize].push(v);
            self.adjacency[v as usize].push(u);
            self.num_edges += 1;
            inserted += 1;
        }

        inserted
    }

    /// Extract the induced subgraph over the given internal ids.
    ///
    /// New internal ids follow the order of `nodes`; external ids are
    /// inherited from this graph.
    pub fn subgraph(&self, nodes: &[u32]) -> Graph {
        // Remap table from old internal ids to subgraph ids
        let mut old_to_new = vec![u32::MAX; self.num_nodes];
        for (new_idx, &old) in nodes.iter().enumerate() {
            old_to_new[old as usize] = new_idx as u32;
        }

        let mut adjacency: Vec<Vec<u32>> = Vec::with_capacity(nodes.len());
        let mut endpoint_total = 0usize;

        for &old in nodes {
            let mut list = Vec::new();
            for &neighbor in self.neighbors(old) {
                let mapped = old_to_new[neighbor as usize];
                if mapped != u32::MAX {
                    list.push(mapped);
                }
            }
            endpoint_total += list.len();
            adjacency.push(list);
        }

        let id_map: Vec<u64> = nodes.iter().map(|&old| self.id_map[old as usize]).collect();

        Graph::from_parts(adjacency, id_map, endpoint_total / 2)
    }

    /// Estimate heap memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let lists: usize = self
            .adjacency
            .iter()
            .map(|list| list.capacity() * mem::size_of::<u32>() + mem::size_of::<Vec<u32>>())
            .sum();
        let ids = self.id_map.capacity() * mem::size_of::<u64>();
        let map = self.node_map.capacity() * (mem::size_of::<u64>() + mem::size_of::<u32>());

        base + lists + ids + map
    }
}
