//! Minimum k-core containing a query node

use std::collections::HashSet;

use crate::graph::{compute_kcore_decomposition, Graph};

/// Result of a minimum k-core query
#[derive(Debug, Clone)]
pub struct MinimumKCore {
    /// External ids of the nodes in the minimum k-core
    pub nodes: Vec<u64>,

    /// The requested minimum degree k
    pub k_value: u32,

    /// Whether a k-core containing the query node was found
    pub found: bool,
}

impl MinimumKCore {
    fn not_found(k: u32) -> Self {
        Self {
            nodes: Vec::new(),
            k_value: k,
            found: false,
        }
    }
}

/// Check the s-plex property: every member has intra-set degree
/// >= |set| - s.
fn is_s_plex(graph: &Graph, vertex_set: &[u32], s: usize) -> bool {
    if vertex_set.len() <= s {
        return true;
    }

    let members: HashSet<u32> = vertex_set.iter().copied().collect();
    let required = vertex_set.len() - s;

    for &node in vertex_set {
        let degree_in_set = graph
            .neighbors(node)
            .iter()
            .filter(|neighbor| members.contains(neighbor))
            .count();
        if degree_in_set < required {
            return false;
        }
    }

    true
}

/// Depth-first search for an s-plex of exactly `target` vertices.
///
/// Candidates are consumed in position order; partial sets that already
/// violate the s-plex lower bound are pruned.
fn backtrack_s_plex(
    graph: &Graph,
    current: &mut Vec<u32>,
    candidates: &[u32],
    s: usize,
    target: usize,
) -> Option<Vec<u32>> {
    if current.len() == target {
        if is_s_plex(graph, current, s) {
            return Some(current.clone());
        }
        return None;
    }

    if current.len() + candidates.len() < target || current.len() > target {
        return None;
    }

    for (position, &vertex) in candidates.iter().enumerate() {
        current.push(vertex);

        if is_s_plex(graph, current, s) {
            if let Some(result) =
                backtrack_s_plex(graph, current, &candidates[position + 1..], s, target)
            {
                current.pop();
                return Some(result);
            }
        }

        current.pop();
    }

    None
}

/// Search for an s-plex of the given size containing the query node.
/// The candidate set is limited to the query node's first-hop neighborhood.
fn find_s_plex_with_size(
    graph: &Graph,
    query: u32,
    s: usize,
    target: usize,
) -> Option<Vec<u32>> {
    let mut current = vec![query];
    let candidates: Vec<u32> = graph.neighbors(query).to_vec();

    backtrack_s_plex(graph, &mut current, &candidates, s, target)
}

/// Find the minimum k-core containing a query node.
///
/// Searches for the smallest s >= 1 admitting an s-plex of size s + k that
/// contains the query node; such an s-plex is a smallest k-core through it.
/// Candidates are drawn from the query node's first-hop neighborhood, so
/// k-cores whose remaining members sit two or more hops away are not found.
pub fn find_minimum_kcore_containing(graph: &Graph, query_node: u64, k: u32) -> MinimumKCore {
    let kcore = compute_kcore_decomposition(graph);
    find_minimum_kcore_containing_cached(graph, query_node, k, &kcore.core_numbers)
}

/// Minimum k-core query against precomputed core numbers
pub fn find_minimum_kcore_containing_cached(
    graph: &Graph,
    query_node: u64,
    k: u32,
    core_numbers: &[u32],
) -> MinimumKCore {
    let Some(query) = graph.internal_id(query_node) else {
        return MinimumKCore::not_found(k);
    };

    if core_numbers[query as usize] < k {
        return MinimumKCore::not_found(k);
    }

    let n = graph.num_nodes;
    let max_s = n.saturating_sub(k as usize);

    for s in 1..=max_s {
        let target = s + k as usize;
        if target > n {
            break;
        }

        if let Some(vertex_set) = find_s_plex_with_size(graph, query, s, target) {
            let nodes = vertex_set
                .into_iter()
                .map(|internal| graph.external_id(internal))
                .collect();
            return MinimumKCore {
                nodes,
                k_value: k,
                found: true,
            };
        }
    }

    MinimumKCore::not_found(k)
}

/// Find the smallest k-core anywhere in the graph.
///
/// Runs the per-node query for every vertex of core number >= k, reusing a
/// single decomposition, and keeps the smallest result.
pub fn find_minimum_kcore(graph: &Graph, k: u32) -> MinimumKCore {
    let kcore = compute_kcore_decomposition(graph);
    find_minimum_kcore_cached(graph, k, &kcore.core_numbers)
}

/// Global minimum k-core search against precomputed core numbers
pub fn find_minimum_kcore_cached(graph: &Graph, k: u32, core_numbers: &[u32]) -> MinimumKCore {
    let mut best = MinimumKCore::not_found(k);

    for (internal, &core) in core_numbers.iter().enumerate() {
        if core < k {
            continue;
        }

        let query = graph.external_id(internal as u32);
        let result = find_minimum_kcore_containing_cached(graph, query, k, core_numbers);

        if result.found && (!best.found || result.nodes.len() < best.nodes.len()) {
            best = result;
        }
    }

    best
}
