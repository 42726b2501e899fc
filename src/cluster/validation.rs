//! Cluster validity checks and modularity scoring

use std::collections::HashSet;

use crate::graph::Graph;

/// Check whether a component is k-valid: every member has at least k
/// neighbors inside the component.
pub fn is_k_valid(component: &[u32], graph: &Graph, k: u32) -> bool {
    let members: HashSet<u32> = component.iter().copied().collect();

    for &node in component {
        let degree_in_component = graph
            .neighbors(node)
            .iter()
            .filter(|neighbor| members.contains(neighbor))
            .count() as u32;

        if degree_in_component < k {
            return false;
        }
    }

    true
}

/// Modularity of a component in the original graph.
///
/// `Q = ls/L - (ds/(2L))^2` where `ls` is the number of intra-component
/// edges, `ds` the degree sum over members, and `L` the total edge count.
/// The component is given as internal ids of `orig_graph`.
pub fn modularity(component: &[u32], orig_graph: &Graph) -> f64 {
    let total_edges = orig_graph.num_edges;
    if total_edges == 0 {
        return 0.0;
    }

    let members: HashSet<u32> = component.iter().copied().collect();

    let mut intra_edges = 0usize;
    let mut degree_sum = 0u64;
    for &node in component {
        degree_sum += orig_graph.degree(node) as u64;
        for &neighbor in orig_graph.neighbors(node) {
            // Count each undirected edge once
            if node < neighbor && members.contains(&neighbor) {
                intra_edges += 1;
            }
        }
    }

    let l = total_edges as f64;
    intra_edges as f64 / l - (degree_sum as f64 / (2.0 * l)).powi(2)
}

/// Modularity of a single node treated as its own cluster
pub fn singleton_modularity(node: u32, orig_graph: &Graph) -> f64 {
    let total_edges = orig_graph.num_edges;
    if total_edges == 0 {
        return 0.0;
    }

    let degree = orig_graph.degree(node) as f64;
    -(degree / (2.0 * total_edges as f64)).powi(2)
}
