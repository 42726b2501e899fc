//! Results persistence module

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, to_string_pretty};

use crate::cluster::{Cluster, ClusteringResult};
use crate::graph::Graph;

/// Output format for cluster assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Header-less rows `node,cluster_index,k_value,modularity`
    Csv,

    /// Header-less rows `node<TAB>cluster_index`
    Tsv,
}

/// Write cluster assignments to a file.
///
/// Cluster indices are 1-based and follow the order the clusters were
/// emitted in.
pub fn write_clusters(path: &Path, clusters: &[Cluster], format: OutputFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not open output file {}", path.display()))?;
    let mut out = BufWriter::new(file);

    for (idx, cluster) in clusters.iter().enumerate() {
        let cluster_index = idx + 1;
        for &node in &cluster.nodes {
            match format {
                OutputFormat::Csv => writeln!(
                    out,
                    "{},{},{},{}",
                    node, cluster_index, cluster.k_value, cluster.modularity
                )?,
                OutputFormat::Tsv => writeln!(out, "{}\t{}", node, cluster_index)?,
            }
        }
    }

    out.flush()?;
    log::info!("results written to {}", path.display());

    Ok(())
}

/// Write a JSON summary of a clustering run
pub fn write_summary(path: &Path, graph: &Graph, result: &ClusteringResult) -> Result<()> {
    let clusters = &result.clusters;
    let clustered_nodes: usize = clusters.iter().map(|c| c.nodes.len()).sum();
    let largest = clusters.iter().map(|c| c.nodes.len()).max().unwrap_or(0);
    let max_k = clusters.iter().map(|c| c.k_value).max().unwrap_or(0);
    let singletons = clusters.iter().filter(|c| c.nodes.len() == 1).count();

    let summary = json!({
        "graph": {
            "node_count": graph.num_nodes,
            "edge_count": graph.num_edges,
        },
        "clustering": {
            "cluster_count": clusters.len(),
            "clustered_nodes": clustered_nodes,
            "largest_cluster_size": largest,
            "singleton_count": singletons,
            "max_k_value": max_k,
            "failed_k_valid": result.failed_k_valid,
            "failed_modularity": result.failed_modularity,
        }
    });

    let file = File::create(path)
        .with_context(|| format!("could not open summary file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(to_string_pretty(&summary)?.as_bytes())?;
    out.write_all(b"\n")?;

    log::info!("summary written to {}", path.display());

    Ok(())
}
