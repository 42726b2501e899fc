//! Connected components over undirected graphs

use std::collections::VecDeque;

use crate::graph::Graph;

/// Find connected components using BFS.
///
/// Returns one vector of internal node ids per component, in the order the
/// components are first reached.
pub fn find_connected_components(graph: &Graph) -> Vec<Vec<u32>> {
    let n = graph.num_nodes;
    let mut components = Vec::new();
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();

    for start in 0..n as u32 {
        if visited[start as usize] {
            continue;
        }

        let mut component = Vec::new();
        queue.push_back(start);
        visited[start as usize] = true;

        while let Some(node) = queue.pop_front() {
            component.push(node);
            for &neighbor in graph.neighbors(node) {
                if !visited[neighbor as usize] {
                    visited[neighbor as usize] = true;
                    queue.push_back(neighbor);
                }
            }
        }

        components.push(component);
    }

    components
}
