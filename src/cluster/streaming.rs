//! Streaming maintenance of a clustering under edge and node insertion

use std::collections::{HashSet, VecDeque};
use std::mem;
use std::time::Instant;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::cluster::ikc::{iterative_kcore_clustering, IkcOptions};
use crate::cluster::Cluster;
use crate::graph::{compute_kcore_decomposition, Graph};

/// Sentinel for nodes not assigned to any cluster
const UNASSIGNED: u32 = u32::MAX;

/// Statistics about a single streaming update
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateStats {
    /// Nodes whose core number was promoted
    pub affected_nodes: usize,

    /// Clusters invalidated and recomputed
    pub invalidated_clusters: usize,

    /// Clusters kept without recomputation
    pub valid_clusters: usize,

    /// Size of the localized recompute region
    pub merge_candidates: usize,

    /// Time spent in the localized recompute
    pub recompute_time_ms: f64,

    /// Total wall-clock time of the update
    pub total_time_ms: f64,
}

/// Incrementally maintained k-core clustering.
///
/// Seeds the clustering with a full run of the iterative algorithm, then
/// keeps it current under edge and node insertions by promoting core
/// numbers incrementally, invalidating only the clusters the promotions can
/// reach, and re-clustering the affected region in isolation.
pub struct StreamingIkc {
    /// Current graph, mutated by insertions
    graph: Graph,

    /// Frozen copy of the seed graph, used for modularity denominators
    orig_graph: Graph,

    /// Current clustering
    clusters: Vec<Cluster>,

    /// Cached core number per internal node id
    core_numbers: Vec<u32>,

    /// Cluster index per internal node id, `UNASSIGNED` when none
    cluster_assignment: Vec<u32>,

    options: IkcOptions,
    max_core: u32,
    last_stats: UpdateStats,

    batch_mode: bool,
    pending_edges: Vec<(u64, u64)>,
    pending_nodes: Vec<u64>,
}

impl StreamingIkc {
    /// Create a streaming clustering over the given graph
    pub fn new(graph: Graph, min_k: u32) -> Self {
        let num_nodes = graph.num_nodes;
        let orig_graph = graph.clone();

        Self {
            graph,
            orig_graph,
            clusters: Vec::new(),
            core_numbers: Vec::new(),
            cluster_assignment: vec![UNASSIGNED; num_nodes],
            options: IkcOptions {
                min_k,
                exact_modularity: false,
            },
            max_core: 0,
            last_stats: UpdateStats::default(),
            batch_mode: false,
            pending_edges: Vec::new(),
            pending_nodes: Vec::new(),
        }
    }

    /// Run the initial clustering and prime the incremental caches
    pub fn initial_clustering(&mut self) -> &[Cluster] {
        self.clusters =
            iterative_kcore_clustering(self.graph.clone(), &self.orig_graph, &self.options, None)
                .clusters;

        let kcore = compute_kcore_decomposition(&self.graph);
        self.core_numbers = kcore.core_numbers;
        self.max_core = kcore.max_core;
        self.update_cluster_assignments();

        log::info!(
            "initial clustering: {} clusters, max core {}",
            self.clusters.len(),
            self.max_core
        );

        &self.clusters
    }

    /// Add undirected edges given as external id pairs.
    ///
    /// Edges whose endpoints are unknown are skipped with a warning; use
    /// [`StreamingIkc::update`] to add edges together with their nodes.
    /// With `recompute` unset the clustering is left stale, to be refreshed
    /// by a later update.
    pub fn add_edges(&mut self, edges: &[(u64, u64)], recompute: bool) -> &[Cluster] {
        if self.batch_mode {
            self.pending_edges.extend_from_slice(edges);
            return &self.clusters;
        }

        if edges.is_empty() {
            return &self.clusters;
        }

        let start = Instant::now();

        let mut internal_edges = Vec::with_capacity(edges.len());
        for &(u_ext, v_ext) in edges {
            match (self.graph.internal_id(u_ext), self.graph.internal_id(v_ext)) {
                (Some(u), Some(v)) => internal_edges.push((u, v)),
                _ => {
                    log::warn!(
                        "skipping edge ({}, {}): unknown endpoint",
                        u_ext,
                        v_ext
                    );
                }
            }
        }

        if internal_edges.is_empty() {
            return &self.clusters;
        }

        self.graph.add_edges(&internal_edges);

        if !recompute {
            return &self.clusters;
        }

        let affected = self.update_core_numbers_incremental(&internal_edges);

        let recompute_start = Instant::now();
        let (valid_indices, invalid_indices, nodes_to_recompute) =
            self.detect_invalid_clusters(&affected);

        if invalid_indices.is_empty() && nodes_to_recompute.is_empty() {
            self.last_stats = UpdateStats {
                affected_nodes: affected.len(),
                invalidated_clusters: 0,
                valid_clusters: self.clusters.len(),
                merge_candidates: 0,
                recompute_time_ms: 0.0,
                total_time_ms: start.elapsed().as_secs_f64() * 1e3,
            };
            return &self.clusters;
        }

        let new_clusters = self.recompute_affected_clusters(&nodes_to_recompute);
        let recompute_time_ms = recompute_start.elapsed().as_secs_f64() * 1e3;

        let mut updated: Vec<Cluster> = valid_indices
            .iter()
            .map(|&idx| self.clusters[idx].clone())
            .collect();
        updated.extend(new_clusters);

        self.clusters = updated;
        self.update_cluster_assignments();

        self.last_stats = UpdateStats {
            affected_nodes: affected.len(),
            invalidated_clusters: invalid_indices.len(),
            valid_clusters: valid_indices.len(),
            merge_candidates: nodes_to_recompute.len(),
            recompute_time_ms,
            total_time_ms: start.elapsed().as_secs_f64() * 1e3,
        };

        log::debug!(
            "update: {} affected nodes, {} invalidated clusters, {} clusters total",
            self.last_stats.affected_nodes,
            self.last_stats.invalidated_clusters,
            self.clusters.len()
        );

        &self.clusters
    }

    /// Add isolated nodes given as external ids.
    ///
    /// With `recompute` set, each new node immediately becomes a k=0
    /// singleton cluster; otherwise materialization is left to a later
    /// update.
    pub fn add_nodes(&mut self, nodes: &[u64], recompute: bool) -> &[Cluster] {
        if self.batch_mode {
            self.pending_nodes.extend_from_slice(nodes);
            return &self.clusters;
        }

        if nodes.is_empty() {
            return &self.clusters;
        }

        for &external in nodes {
            if self.graph.add_node(external).is_ok() {
                self.core_numbers.push(0);
                self.cluster_assignment.push(UNASSIGNED);
            }
        }

        if recompute {
            let mut materialized = false;
            for &external in nodes {
                if let Some(internal) = self.graph.internal_id(external) {
                    if self.cluster_assignment[internal as usize] == UNASSIGNED {
                        self.clusters.push(Cluster::new(vec![external], 0, 0.0));
                        materialized = true;
                    }
                }
            }
            if materialized {
                self.update_cluster_assignments();
            }
        }

        log::debug!("added {} isolated nodes", nodes.len());

        &self.clusters
    }

    /// Apply a combined batch of new nodes and edges.
    ///
    /// Every edge endpoint must already be in the graph or appear in
    /// `nodes`; otherwise the whole update is rejected. New nodes that stay
    /// unassigned after the edge phase become k=0 singleton clusters.
    pub fn update(&mut self, edges: &[(u64, u64)], nodes: &[u64]) -> Result<&[Cluster]> {
        if !edges.is_empty() {
            let incoming: HashSet<u64> = nodes.iter().copied().collect();

            for &(u, v) in edges {
                let u_known = self.graph.contains(u) || incoming.contains(&u);
                let v_known = self.graph.contains(v) || incoming.contains(&v);

                if !u_known || !v_known {
                    let mut missing = Vec::new();
                    if !u_known {
                        missing.push(u.to_string());
                    }
                    if !v_known {
                        missing.push(v.to_string());
                    }
                    bail!(
                        "edge ({}, {}) references non-existent node(s): {}; \
                         every endpoint must exist in the graph or be listed in the new nodes",
                        u,
                        v,
                        missing.join(", ")
                    );
                }
            }
        }

        self.add_nodes(nodes, false);

        if !edges.is_empty() {
            self.add_edges(edges, true);
        }

        // Whatever the edge phase left unassigned becomes a singleton
        let mut materialized = false;
        for &external in nodes {
            if let Some(internal) = self.graph.internal_id(external) {
                if self.cluster_assignment[internal as usize] == UNASSIGNED {
                    self.clusters.push(Cluster::new(vec![external], 0, 0.0));
                    materialized = true;
                }
            }
        }
        if materialized {
            self.update_cluster_assignments();
        }

        Ok(&self.clusters)
    }

    /// Enter batch mode; subsequent insertions accumulate without updating
    pub fn begin_batch(&mut self) {
        self.batch_mode = true;
        self.pending_edges.clear();
        self.pending_nodes.clear();
    }

    /// Leave batch mode and apply all pending insertions as one update
    pub fn commit_batch(&mut self) -> Result<&[Cluster]> {
        if !self.batch_mode {
            log::warn!("commit_batch called outside batch mode");
            return Ok(&self.clusters);
        }

        self.batch_mode = false;
        let edges = mem::take(&mut self.pending_edges);
        let nodes = mem::take(&mut self.pending_nodes);

        log::debug!(
            "committing batch: {} edges, {} nodes",
            edges.len(),
            nodes.len()
        );

        self.update(&edges, &nodes)
    }

    /// Promote core numbers after a batch of new internal edges.
    ///
    /// Only the batch's highest core level `k` can gain a level in one
    /// round. The candidate region is every level-`k` node reachable from
    /// the batch endpoints through level-`k` nodes; it is peeled down to the
    /// members that keep at least `k + 1` neighbors inside the region or
    /// above the level, and the survivors are promoted to `k + 1`. Returns
    /// the promoted nodes.
    fn update_core_numbers_incremental(&mut self, new_edges: &[(u32, u32)]) -> HashSet<u32> {
        let mut affected = HashSet::new();

        if new_edges.is_empty() {
            return affected;
        }

        let mut k_max = 0u32;
        for &(u, v) in new_edges {
            let level = self.core_numbers[u as usize].max(self.core_numbers[v as usize]);
            k_max = k_max.max(level);
        }

        // Candidate region: level-k_max nodes reachable from the batch
        let mut region = HashSet::new();
        let mut queue = VecDeque::new();
        for &(u, v) in new_edges {
            for node in [u, v] {
                if self.core_numbers[node as usize] == k_max && region.insert(node) {
                    queue.push_back(node);
                }
            }
        }
        while let Some(node) = queue.pop_front() {
            for &w in self.graph.neighbors(node) {
                if self.core_numbers[w as usize] == k_max && region.insert(w) {
                    queue.push_back(w);
                }
            }
        }

        // Peel the region down to the members that can sustain level
        // k_max + 1; neighbors already above the level count as support
        let mut pruned = true;
        while pruned {
            pruned = false;
            let members: Vec<u32> = region.iter().copied().collect();
            for node in members {
                let support = self
                    .graph
                    .neighbors(node)
                    .iter()
                    .filter(|&&w| {
                        region.contains(&w) || self.core_numbers[w as usize] > k_max
                    })
                    .count() as u32;
                if support < k_max + 1 {
                    region.remove(&node);
                    pruned = true;
                }
            }
        }

        for &node in &region {
            self.core_numbers[node as usize] = k_max + 1;
            affected.insert(node);
        }
        if !region.is_empty() {
            self.max_core = self.max_core.max(k_max + 1);
        }

        affected
    }

    /// Split the clustering into untouched clusters and clusters that must
    /// be recomputed, collecting the localized recompute region.
    ///
    /// A cluster without promoted members is untouched. A cluster with a
    /// promoted member is rechecked for k-validity and probed for external
    /// neighbors at its own core level; either failure sends its nodes (and
    /// in the merge case those neighbors) into the recompute region.
    fn detect_invalid_clusters(
        &self,
        affected: &HashSet<u32>,
    ) -> (Vec<usize>, Vec<usize>, HashSet<u32>) {
        let mut valid_indices = Vec::new();
        let mut invalid_indices = Vec::new();
        let mut nodes_to_recompute = HashSet::new();

        for (cluster_idx, cluster) in self.clusters.iter().enumerate() {
            let has_affected = cluster.nodes.iter().any(|&external| {
                self.graph
                    .internal_id(external)
                    .is_some_and(|internal| affected.contains(&internal))
            });

            if !has_affected {
                valid_indices.push(cluster_idx);
                continue;
            }

            let k = cluster.k_value;
            let member_set: HashSet<u64> = cluster.nodes.iter().copied().collect();

            let mut k_valid = true;
            for &external in &cluster.nodes {
                let Some(internal) = self.graph.internal_id(external) else {
                    k_valid = false;
                    break;
                };

                let internal_degree = self
                    .graph
                    .neighbors(internal)
                    .iter()
                    .filter(|&&w| member_set.contains(&self.graph.external_id(w)))
                    .count() as u32;

                if internal_degree < k {
                    k_valid = false;
                    break;
                }
            }

            if !k_valid {
                invalid_indices.push(cluster_idx);
                for &external in &cluster.nodes {
                    if let Some(internal) = self.graph.internal_id(external) {
                        nodes_to_recompute.insert(internal);
                    }
                }
                continue;
            }

            // An external neighbor at this core level can absorb the cluster
            let has_merge_candidates = cluster.nodes.iter().any(|&external| {
                self.graph.internal_id(external).is_some_and(|internal| {
                    self.graph.neighbors(internal).iter().any(|&w| {
                        !member_set.contains(&self.graph.external_id(w))
                            && self.core_numbers[w as usize] >= k
                    })
                })
            });

            if has_merge_candidates {
                invalid_indices.push(cluster_idx);
                for &external in &cluster.nodes {
                    let Some(internal) = self.graph.internal_id(external) else {
                        continue;
                    };
                    nodes_to_recompute.insert(internal);
                    for &w in self.graph.neighbors(internal) {
                        if self.core_numbers[w as usize] >= k {
                            nodes_to_recompute.insert(w);
                        }
                    }
                }
            } else {
                valid_indices.push(cluster_idx);
            }
        }

        (valid_indices, invalid_indices, nodes_to_recompute)
    }

    /// Re-cluster the affected region in isolation
    fn recompute_affected_clusters(&self, nodes_to_recompute: &HashSet<u32>) -> Vec<Cluster> {
        if nodes_to_recompute.is_empty() {
            return Vec::new();
        }

        log::debug!("recomputing {} affected nodes", nodes_to_recompute.len());

        let mut region: Vec<u32> = nodes_to_recompute.iter().copied().collect();
        region.sort_unstable();

        let subgraph = self.graph.subgraph(&region);
        iterative_kcore_clustering(subgraph, &self.orig_graph, &self.options, None).clusters
    }

    /// Rebuild the internal id -> cluster index mapping
    fn update_cluster_assignments(&mut self) {
        self.cluster_assignment = vec![UNASSIGNED; self.graph.num_nodes];

        for (cluster_idx, cluster) in self.clusters.iter().enumerate() {
            for &external in &cluster.nodes {
                if let Some(internal) = self.graph.internal_id(external) {
                    self.cluster_assignment[internal as usize] = cluster_idx as u32;
                }
            }
        }
    }

    /// Current clustering
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Cached core number per internal node id
    pub fn core_numbers(&self) -> &[u32] {
        &self.core_numbers
    }

    /// The current graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Statistics from the most recent non-batched update
    pub fn last_stats(&self) -> &UpdateStats {
        &self.last_stats
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.graph.num_edges
    }

    pub fn max_core(&self) -> u32 {
        self.max_core
    }

    pub fn is_batch_mode(&self) -> bool {
        self.batch_mode
    }
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

    fn node_sets(clusters: &[Cluster]) -> Vec<Vec<u64>> {
        let mut sets: Vec<Vec<u64>> = clusters
            .iter()
            .map(|c| {
                let mut nodes = c.nodes.clone();
                nodes.sort_unstable();
                nodes
            })
            .collect();
        sets.sort();
        sets
    }

    /// Triangle 0-1-2, square 3-4-5-6, bridge 2-3
    fn seed_edges() -> Vec<(u64, u64)> {
        vec![
            (0, 1),
            (1, 2),
            (2, 0),
            (3, 4),
            (4, 5),
            (5, 6),
            (6, 3),
            (2, 3),
        ]
    }

    #[test]
    fn initial_clustering_primes_caches() {
        let mut streaming = StreamingIkc::new(graph_from_edges(&seed_edges()), 2);
        let clusters = streaming.initial_clustering().to_vec();

        assert!(!clusters.is_empty());
        assert_eq!(streaming.max_core(), 2);
        assert_eq!(streaming.core_numbers().len(), streaming.num_nodes());
        assert_eq!(streaming.num_edges(), 8);
    }

    #[test]
    fn bridge_edge_between_clusters_changes_nothing() {
        let edges = [(1, 2), (2, 3), (1, 3), (4, 5), (5, 6), (4, 6)];
        let mut streaming = StreamingIkc::new(graph_from_edges(&edges), 0);
        streaming.initial_clustering();
        let before = node_sets(streaming.clusters());

        streaming.add_edges(&[(3, 4)], true);
        assert_eq!(node_sets(streaming.clusters()), before);
        assert_eq!(streaming.last_stats().affected_nodes, 0);
        assert_eq!(streaming.last_stats().invalidated_clusters, 0);

        streaming.add_edges(&[(1, 4)], true);
        assert_eq!(node_sets(streaming.clusters()), before);
        assert_eq!(streaming.num_edges(), 8);
    }

    #[test]
    fn unknown_endpoints_are_skipped_outside_update() {
        let mut streaming = StreamingIkc::new(graph_from_edges(&[(1, 2), (2, 3), (1, 3)]), 0);
        streaming.initial_clustering();

        streaming.add_edges(&[(1, 99)], true);
        assert_eq!(streaming.num_edges(), 3);
        assert_eq!(streaming.clusters().len(), 1);
    }

    #[test]
    fn add_nodes_materializes_singletons() {
        let mut streaming = StreamingIkc::new(graph_from_edges(&[(1, 2), (2, 3), (1, 3)]), 2);
        streaming.initial_clustering();

        streaming.add_nodes(&[100, 101], true);
        assert_eq!(streaming.num_nodes(), 5);
        assert!(node_sets(streaming.clusters()).contains(&vec![100]));
        assert!(node_sets(streaming.clusters()).contains(&vec![101]));

        let singleton = streaming
            .clusters()
            .iter()
            .find(|c| c.nodes == vec![100])
            .unwrap();
        assert_eq!(singleton.k_value, 0);
        assert_eq!(singleton.modularity, 0.0);
    }

    #[test]
    fn update_rejects_unknown_endpoints() {
        let mut streaming = StreamingIkc::new(graph_from_edges(&[(1, 2), (2, 3), (1, 3)]), 0);
        streaming.initial_clustering();

        let err = streaming.update(&[(9999, 8888)], &[]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("(9999, 8888)"));
        assert!(message.contains("9999"));
        assert!(message.contains("8888"));

        // Including the endpoints as new nodes makes the same update valid
        streaming.update(&[(9999, 8888)], &[9999, 8888]).unwrap();
        assert!(streaming.graph().contains(9999));
        assert!(streaming.graph().contains(8888));
    }

    #[test]
    fn update_with_only_nodes_creates_singletons() {
        let mut streaming = StreamingIkc::new(graph_from_edges(&[(1, 2), (2, 3), (1, 3)]), 0);
        streaming.initial_clustering();

        streaming.update(&[], &[50, 51]).unwrap();
        assert!(node_sets(streaming.clusters()).contains(&vec![50]));
        assert!(node_sets(streaming.clusters()).contains(&vec![51]));
    }

    #[test]
    fn batch_commit_equals_single_update() {
        let seed = seed_edges();

        let mut batched = StreamingIkc::new(graph_from_edges(&seed), 2);
        batched.initial_clustering();
        batched.begin_batch();
        assert!(batched.is_batch_mode());
        batched.add_edges(&[(0, 3)], true);
        batched.add_edges(&[(1, 4)], true);
        batched.add_nodes(&[100], true);
        batched.commit_batch().unwrap();
        assert!(!batched.is_batch_mode());

        let mut direct = StreamingIkc::new(graph_from_edges(&seed), 2);
        direct.initial_clustering();
        direct.update(&[(0, 3), (1, 4)], &[100]).unwrap();

        assert_eq!(node_sets(batched.clusters()), node_sets(direct.clusters()));
        assert_eq!(batched.num_edges(), direct.num_edges());
    }

    #[test]
    fn commit_outside_batch_mode_is_a_no_op() {
        let mut streaming = StreamingIkc::new(graph_from_edges(&[(1, 2), (2, 3), (1, 3)]), 0);
        streaming.initial_clustering();
        let before = node_sets(streaming.clusters());

        streaming.commit_batch().unwrap();
        assert_eq!(node_sets(streaming.clusters()), before);
    }

    #[test]
    fn core_numbers_never_decrease() {
        let mut streaming = StreamingIkc::new(graph_from_edges(&seed_edges()), 0);
        streaming.initial_clustering();
        let before = streaming.core_numbers().to_vec();

        // These edges leave every node with degree >= 3, so the whole
        // graph becomes a 3-core
        streaming.add_edges(&[(0, 3), (0, 4), (1, 5), (2, 6)], true);
        let after = streaming.core_numbers();
        for (idx, &core) in before.iter().enumerate() {
            assert!(after[idx] >= core);
        }
        assert!(after.iter().all(|&core| core == 3));
        assert_eq!(streaming.last_stats().affected_nodes, 7);
        assert_eq!(streaming.max_core(), 3);
    }

    #[test]
    fn promotion_merges_clusters_into_one() {
        // Two triangles; the perfect matching completes a 3-regular prism,
        // promoting every core to 3 and invalidating both clusters
        let edges = [(1, 2), (2, 3), (1, 3), (4, 5), (5, 6), (4, 6)];
        let mut streaming = StreamingIkc::new(graph_from_edges(&edges), 0);
        streaming.initial_clustering();
        assert_eq!(streaming.clusters().len(), 2);

        streaming.add_edges(&[(1, 4), (2, 5), (3, 6)], true);

        assert_eq!(streaming.last_stats().affected_nodes, 6);
        assert_eq!(streaming.last_stats().invalidated_clusters, 2);
        assert_eq!(streaming.last_stats().valid_clusters, 0);
        assert_eq!(
            node_sets(streaming.clusters()),
            vec![vec![1, 2, 3, 4, 5, 6]]
        );
        assert_eq!(streaming.clusters()[0].k_value, 3);
        assert!(streaming.core_numbers().iter().all(|&core| core == 3));
        assert_eq!(streaming.max_core(), 3);
    }

    #[test]
    fn intra_cluster_edge_matches_from_scratch() {
        // Square 1-2-3-4; the diagonal leaves every core number at 2
        let edges = [(1, 2), (2, 3), (3, 4), (4, 1)];
        let mut streaming = StreamingIkc::new(graph_from_edges(&edges), 0);
        streaming.initial_clustering();
        streaming.add_edges(&[(1, 3)], true);

        let mut final_edges = edges.to_vec();
        final_edges.push((1, 3));
        let scratch_graph = graph_from_edges(&final_edges);
        let scratch = iterative_kcore_clustering(
            scratch_graph.clone(),
            &scratch_graph,
            &IkcOptions::default(),
            None,
        );

        assert_eq!(node_sets(streaming.clusters()), node_sets(&scratch.clusters));
    }
}
