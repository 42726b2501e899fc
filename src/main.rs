use std::path::PathBuf;
use std::process;

use anyhow::{bail, Result};
use clap::error::ErrorKind;
use clap::Parser;

mod config;
mod data;
mod graph;
mod cluster;
mod search;
mod storage;

use cluster::ikc::{iterative_kcore_clustering, IkcOptions};
use config::Config;
use storage::OutputFormat;

#[derive(Parser, Debug)]
#[clap(
    name = "ikc",
    about = "Iterative k-core clustering of large undirected graphs"
)]
struct Cli {
    /// Path to the input graph edge list (TSV format)
    #[clap(short = 'e', long = "edge-list")]
    edge_list: PathBuf,

    /// Path to the output file
    #[clap(short = 'o', long = "output")]
    output: PathBuf,

    /// Minimum k value for emitted clusters
    #[clap(short = 'k', long = "min-k", default_value = "0")]
    min_k: u32,

    /// Number of worker threads (0 = use all available cores)
    #[clap(short = 't', long = "threads", default_value = "0")]
    threads: usize,

    /// Quiet mode (suppress progress output)
    #[clap(short = 'q', long)]
    quiet: bool,

    /// Emit TSV (node_id<TAB>cluster_id) without header instead of CSV
    #[clap(long)]
    tsv: bool,

    /// Write a JSON run summary to this path
    #[clap(long)]
    summary: Option<PathBuf>,

    /// Score clusters with the exact modularity formula
    #[clap(long)]
    exact_modularity: bool,
}

fn main() {
    // Missing or malformed arguments exit 1; help and version exit 0
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            let _ = err.print();
            process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(args: Cli) -> Result<()> {
    let log_level = if args.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = Config::new(args.min_k, args.threads, args.exact_modularity);

    let num_threads = if config.threads > 0 {
        config.threads
    } else {
        num_cpus::get()
    };

    log::info!("using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    // 1. Load the graph
    let graph = data::load_tsv_edgelist(&args.edge_list)?;
    if graph.num_nodes == 0 {
        bail!("graph {} is empty", args.edge_list.display());
    }

    // 2. Cluster
    let options = IkcOptions {
        min_k: config.min_k,
        exact_modularity: config.exact_modularity,
    };
    log::info!("clustering with min_k = {}", options.min_k);

    let orig_graph = graph.clone();
    let result = iterative_kcore_clustering(graph, &orig_graph, &options, None);

    // 3. Save results
    let format = if args.tsv {
        OutputFormat::Tsv
    } else {
        OutputFormat::Csv
    };
    storage::write_clusters(&args.output, &result.clusters, format)?;

    if let Some(summary_path) = &args.summary {
        storage::write_summary(summary_path, &orig_graph, &result)?;
    }

    log::info!(
        "done: {} clusters over {} nodes",
        result.clusters.len(),
        orig_graph.num_nodes
    );

    Ok(())
}
