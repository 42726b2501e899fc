//! Iterative k-core clustering driver

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::cluster::validation::{is_k_valid, modularity, singleton_modularity};
use crate::cluster::Cluster;
use crate::graph::components::find_connected_components;
use crate::graph::{compute_kcore_decomposition, Graph};

/// Options for a clustering run
#[derive(Debug, Clone)]
pub struct IkcOptions {
    /// Minimum k value for emitted clusters
    pub min_k: u32,

    /// Score clusters with the exact modularity formula. The default keeps
    /// the constant sentinel `1.0`, so the modularity gate never rejects.
    pub exact_modularity: bool,
}

impl Default for IkcOptions {
    fn default() -> Self {
        Self {
            min_k: 0,
            exact_modularity: false,
        }
    }
}

/// Clusters plus rejection accounting from one clustering run
#[derive(Debug, Clone)]
pub struct ClusteringResult {
    /// Emitted clusters, in emission order
    pub clusters: Vec<Cluster>,

    /// Components rejected by the k-validity check
    pub failed_k_valid: usize,

    /// Components rejected by the modularity gate
    pub failed_modularity: usize,
}

/// Score a component against the original graph.
///
/// The component is given as external ids; scoring happens on the original
/// graph so the denominator stays stable across peeling iterations.
fn component_modularity(external_ids: &[u64], orig_graph: &Graph, options: &IkcOptions) -> f64 {
    if !options.exact_modularity {
        return 1.0;
    }

    let orig_internal: Vec<u32> = external_ids
        .iter()
        .filter_map(|&ext| orig_graph.internal_id(ext))
        .collect();
    modularity(&orig_internal, orig_graph)
}

/// Run iterative k-core clustering.
///
/// Repeatedly peels the maximum k-core of the working graph, emits its
/// k-valid connected components as clusters, and recurses on the remainder.
/// `orig_graph` is the untouched input graph used for modularity scoring.
/// The progress callback, when given, receives the current maximum core
/// once per outer iteration.
pub fn iterative_kcore_clustering(
    graph: Graph,
    orig_graph: &Graph,
    options: &IkcOptions,
    mut progress: Option<&mut dyn FnMut(u32)>,
) -> ClusteringResult {
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut singletons: Vec<u64> = Vec::new();

    let failed_k_valid = AtomicUsize::new(0);
    let failed_modularity = AtomicUsize::new(0);

    let mut graph = graph;

    while graph.num_nodes > 0 {
        let kcore = compute_kcore_decomposition(&graph);
        let max_k = kcore.max_core;

        if let Some(callback) = progress.as_deref_mut() {
            callback(max_k);
        }

        log::debug!(
            "max k-core {} over {} remaining nodes",
            max_k,
            graph.num_nodes
        );

        // Below the threshold every remaining node becomes a singleton
        if max_k < options.min_k {
            for node in 0..graph.num_nodes as u32 {
                let external = graph.external_id(node);
                let q = orig_graph
                    .internal_id(external)
                    .map(|orig| singleton_modularity(orig, orig_graph))
                    .unwrap_or(0.0);
                clusters.push(Cluster::new(vec![external], 0, q));
            }
            break;
        }

        let kcore_nodes = kcore.kcore_nodes(max_k);
        if kcore_nodes.is_empty() {
            break;
        }

        let subgraph = graph.subgraph(&kcore_nodes);
        let components = find_connected_components(&subgraph);

        log::debug!(
            "{} nodes in the {}-core across {} components",
            kcore_nodes.len(),
            max_k,
            components.len()
        );

        // Components are independent; evaluate them in parallel and merge
        // each outcome under one short lock.
        let accepted: Mutex<Vec<Cluster>> = Mutex::new(Vec::new());
        let rejected: Mutex<Vec<u64>> = Mutex::new(Vec::new());
        let removals: Mutex<Vec<u32>> = Mutex::new(Vec::new());

        components.par_iter().for_each(|component| {
            let graph_ids: Vec<u32> = component
                .iter()
                .map(|&sub_idx| kcore_nodes[sub_idx as usize])
                .collect();
            let external_ids: Vec<u64> = graph_ids
                .iter()
                .map(|&node| graph.external_id(node))
                .collect();

            if !is_k_valid(component, &subgraph, options.min_k) {
                failed_k_valid.fetch_add(1, Ordering::Relaxed);
                removals.lock().unwrap().extend_from_slice(&graph_ids);
                rejected.lock().unwrap().extend_from_slice(&external_ids);
                return;
            }

            let q = component_modularity(&external_ids, orig_graph, options);
            if q <= 0.0 {
                failed_modularity.fetch_add(1, Ordering::Relaxed);
                removals.lock().unwrap().extend_from_slice(&graph_ids);
                rejected.lock().unwrap().extend_from_slice(&external_ids);
                return;
            }

            removals.lock().unwrap().extend_from_slice(&graph_ids);
            accepted
                .lock()
                .unwrap()
                .push(Cluster::new(external_ids, max_k, q));
        });

        clusters.extend(accepted.into_inner().unwrap());
        singletons.extend(rejected.into_inner().unwrap());

        // Compact the working graph onto the surviving nodes
        let removals = removals.into_inner().unwrap();
        let mut removed = vec![false; graph.num_nodes];
        for node in removals {
            removed[node as usize] = true;
        }
        let remaining: Vec<u32> = (0..graph.num_nodes as u32)
            .filter(|&node| !removed[node as usize])
            .collect();
        graph = graph.subgraph(&remaining);
    }

    // Nodes shed by rejected components end up as k=0 singletons
    for external in singletons {
        clusters.push(Cluster::new(vec![external], 0, 0.0));
    }

    let result = ClusteringResult {
        clusters,
        failed_k_valid: failed_k_valid.into_inner(),
        failed_modularity: failed_modularity.into_inner(),
    };

    log::info!(
        "clustering finished: {} clusters, {} components failed k-validity, {} failed modularity",
        result.clusters.len(),
        result.failed_k_valid,
        result.failed_modularity
    );

    result
}
