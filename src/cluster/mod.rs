//! Cluster types and clustering algorithms

pub mod validation;
pub mod ikc;
pub mod streaming;

use serde::{Deserialize, Serialize};

pub use self::ikc::{iterative_kcore_clustering, ClusteringResult, IkcOptions};
pub use self::streaming::{StreamingIkc, UpdateStats};

/// A cohesive subgraph emitted by the clustering engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// External ids of the member nodes
    pub nodes: Vec<u64>,

    /// The k value the cluster was emitted at (0 for singletons)
    pub k_value: u32,

    /// Modularity score of the cluster
    pub modularity: f64,
}

impl Cluster {
    pub fn new(nodes: Vec<u64>, k_value: u32, modularity: f64) -> Self {
        Self {
            nodes,
            k_value,
            modularity,
        }
    }
}
