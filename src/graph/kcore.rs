//! K-core decomposition via bucket peeling

use crate::graph::Graph;

/// Per-node core numbers plus the maximum observed core
#[derive(Debug, Clone)]
pub struct KCoreResult {
    /// Core number for each internal node id
    pub core_numbers: Vec<u32>,

    /// Maximum core number across all nodes
    pub max_core: u32,
}

impl KCoreResult {
    /// Internal ids of all nodes with core number >= k, in id order
    pub fn kcore_nodes(&self, k: u32) -> Vec<u32> {
        self.core_numbers
            .iter()
            .enumerate()
            .filter(|(_, &core)| core >= k)
            .map(|(idx, _)| idx as u32)
            .collect()
    }
}

/// Compute the k-core decomposition using the peeling algorithm.
///
/// Nodes are processed in buckets of residual degree; removing a node
/// demotes its surviving neighbors into lower buckets. Stale bucket entries
/// are filtered at pop time. Runs in O(n + m).
pub fn compute_kcore_decomposition(graph: &Graph) -> KCoreResult {
    let n = graph.num_nodes;
    let mut result = KCoreResult {
        core_numbers: vec![0; n],
        max_core: 0,
    };

    if n == 0 {
        return result;
    }

    let mut degrees: Vec<u32> = (0..n as u32).map(|v| graph.degree(v)).collect();
    let mut removed = vec![false; n];

    let max_degree = *degrees.iter().max().unwrap() as usize;
    let mut bins: Vec<Vec<u32>> = vec![Vec::new(); max_degree + 1];
    for (node, &deg) in degrees.iter().enumerate() {
        bins[deg as usize].push(node as u32);
    }

    let mut current_core = 0u32;
    for bin_idx in 0..=max_degree as u32 {
        while let Some(node) = bins[bin_idx as usize].pop() {
            if removed[node as usize] {
                continue;
            }

            result.core_numbers[node as usize] = bin_idx;
            current_core = current_core.max(bin_idx);
            removed[node as usize] = true;

            for &neighbor in graph.neighbors(node) {
                let ni = neighbor as usize;
                if !removed[ni] && degrees[ni] > bin_idx {
                    degrees[ni] -= 1;
                    bins[degrees[ni] as usize].push(neighbor);
                }
            }
        }
    }

    result.max_core = current_core;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn graph_from_edges(edges: &[(u64, u64)]) -> Graph {
        let mut builder = GraphBuilder::with_capacity(edges.len());
        for &(a, b) in edges {
            builder.add_edge(a, b);
        }
        builder.build()
    }

    /// Reference core number: largest k such that the node survives
    /// repeated removal of vertices with degree < k.
    fn brute_force_core_numbers(graph: &Graph) -> Vec<u32> {
        let n = graph.num_nodes;
        let mut cores = vec![0u32; n];

        for k in 1..=n as u32 {
            let mut alive = vec![true; n];
            loop {
                let mut changed = false;
                for v in 0..n as u32 {
                    if !alive[v as usize] {
                        continue;
                    }
                    let deg = graph
                        .neighbors(v)
                        .iter()
                        .filter(|&&w| alive[w as usize])
                        .count() as u32;
                    if deg < k {
                        alive[v as usize] = false;
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }
            for v in 0..n {
                if alive[v] {
                    cores[v] = k;
                }
            }
        }

        cores
    }

    #[test]
    fn empty_graph() {
        let result = compute_kcore_decomposition(&Graph::new());
        assert!(result.core_numbers.is_empty());
        assert_eq!(result.max_core, 0);
    }

    #[test]
    fn isolated_node_has_core_zero() {
        let mut g = graph_from_edges(&[(1, 2)]);
        g.add_node(9).unwrap();
        let result = compute_kcore_decomposition(&g);
        assert_eq!(result.core_numbers[g.internal_id(9).unwrap() as usize], 0);
        assert_eq!(result.max_core, 1);
    }

    #[test]
    fn triangle_is_a_two_core() {
        let g = graph_from_edges(&[(1, 2), (2, 3), (1, 3)]);
        let result = compute_kcore_decomposition(&g);
        assert_eq!(result.core_numbers, vec![2, 2, 2]);
        assert_eq!(result.max_core, 2);
        assert_eq!(result.kcore_nodes(2), vec![0, 1, 2]);
        assert!(result.kcore_nodes(3).is_empty());
    }

    #[test]
    fn path_is_a_one_core() {
        let g = graph_from_edges(&[(1, 2), (2, 3), (3, 4)]);
        let result = compute_kcore_decomposition(&g);
        assert!(result.core_numbers.iter().all(|&c| c == 1));
        assert_eq!(result.max_core, 1);
    }

    #[test]
    fn triangle_with_pendant() {
        let g = graph_from_edges(&[(1, 2), (2, 3), (1, 3), (3, 4)]);
        let result = compute_kcore_decomposition(&g);
        assert_eq!(result.core_numbers[g.internal_id(4).unwrap() as usize], 1);
        assert_eq!(result.core_numbers[g.internal_id(1).unwrap() as usize], 2);
        assert_eq!(result.max_core, 2);
    }

    #[test]
    fn matches_brute_force_on_small_graphs() {
        let cases: Vec<Vec<(u64, u64)>> = vec![
            vec![(1, 2), (2, 3), (1, 3), (3, 4)],
            vec![(1, 2), (2, 3), (3, 4), (4, 1), (1, 3)],
            // Two triangles joined by a bridge
            vec![(1, 2), (2, 3), (1, 3), (4, 5), (5, 6), (4, 6), (3, 4)],
            // K4 with a tail
            vec![(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4), (4, 5), (5, 6)],
            // Star
            vec![(1, 2), (1, 3), (1, 4), (1, 5)],
        ];

        for edges in cases {
            let g = graph_from_edges(&edges);
            let result = compute_kcore_decomposition(&g);
            assert_eq!(
                result.core_numbers,
                brute_force_core_numbers(&g),
                "mismatch on edges {:?}",
                edges
            );
            assert_eq!(
                result.max_core,
                *result.core_numbers.iter().max().unwrap()
            );
        }
    }
}
