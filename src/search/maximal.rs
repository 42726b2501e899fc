//! Maximal k-core containing a query node

use std::collections::VecDeque;

use crate::graph::{compute_kcore_decomposition, Graph};

/// Result of a maximal k-core query
#[derive(Debug, Clone)]
pub struct MaximalKCore {
    /// External ids of the nodes in the maximal k-core
    pub nodes: Vec<u64>,

    /// The core number of the query node
    pub k_value: u32,

    /// Whether the query node exists in the graph
    pub found: bool,
}

impl MaximalKCore {
    fn not_found() -> Self {
        Self {
            nodes: Vec::new(),
            k_value: 0,
            found: false,
        }
    }
}

/// Find the maximal k-core containing a query node.
///
/// The k value is the query node's core number; the result is the connected
/// component of the query node inside the subgraph induced by all nodes of
/// core number >= k. Computes a fresh decomposition; use
/// [`find_maximal_kcore_cached`] to reuse one across queries.
pub fn find_maximal_kcore(graph: &Graph, query_node: u64) -> MaximalKCore {
    let kcore = compute_kcore_decomposition(graph);
    find_maximal_kcore_cached(graph, query_node, &kcore.core_numbers)
}

/// Maximal k-core query against precomputed core numbers
pub fn find_maximal_kcore_cached(
    graph: &Graph,
    query_node: u64,
    core_numbers: &[u32],
) -> MaximalKCore {
    let Some(start) = graph.internal_id(query_node) else {
        return MaximalKCore::not_found();
    };

    let k = core_numbers[start as usize];
    if k == 0 {
        return MaximalKCore {
            nodes: vec![query_node],
            k_value: 0,
            found: true,
        };
    }

    // BFS restricted to nodes at or above the query's core level
    let mut visited = vec![false; graph.num_nodes];
    let mut queue = VecDeque::new();
    let mut component = Vec::new();

    visited[start as usize] = true;
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        component.push(graph.external_id(node));

        for &neighbor in graph.neighbors(node) {
            let ni = neighbor as usize;
            if core_numbers[ni] >= k && !visited[ni] {
                visited[ni] = true;
                queue.push_back(neighbor);
            }
        }
    }

    MaximalKCore {
        nodes: component,
        k_value: k,
        found: true,
    }
}
