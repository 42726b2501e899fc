//! TSV edge-list loading

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;

use crate::graph::{Graph, GraphBuilder};

/// One parsed line: an edge, or nothing for comments and blanks
fn parse_line(line: &str, line_number: usize) -> Result<Option<(u64, u64)>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut fields = trimmed.split('\t');
    let src = fields
        .next()
        .and_then(|f| f.trim().parse::<u64>().ok())
        .ok_or_else(|| anyhow!("line {}: expected two tab-separated node ids", line_number))?;
    let dst = fields
        .next()
        .and_then(|f| f.trim().parse::<u64>().ok())
        .ok_or_else(|| anyhow!("line {}: expected two tab-separated node ids", line_number))?;

    Ok(Some((src, dst)))
}

/// Load an undirected graph from a TSV edge list.
///
/// One edge per line as two tab-separated 64-bit node ids; lines starting
/// with `#` are comments. Duplicate edges and self-loops are dropped.
pub fn load_tsv_edgelist(path: &Path) -> Result<Graph> {
    log::info!("reading edge list: {}", path.display());

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let lines: Vec<&str> = contents.lines().collect();

    // Parse lines in parallel, then assemble sequentially
    let parsed: Result<Vec<Option<(u64, u64)>>> = lines
        .par_iter()
        .enumerate()
        .map(|(idx, line)| parse_line(line, idx + 1))
        .collect();
    let edges = parsed.with_context(|| format!("malformed edge list {}", path.display()))?;

    let mut builder = GraphBuilder::with_capacity(lines.len());
    for (src, dst) in edges.into_iter().flatten() {
        builder.add_edge(src, dst);
    }

    if builder.dropped_edges() > 0 {
        log::debug!(
            "dropped {} duplicate or self-loop edges",
            builder.dropped_edges()
        );
    }

    let graph = builder.build();
    log::info!(
        "loaded graph: {} nodes, {} edges, ~{} KiB",
        graph.num_nodes,
        graph.num_edges,
        graph.memory_usage() / 1024
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_tsv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_simple_edge_list() {
        let file = write_tsv("1\t2\n2\t3\n1\t3\n");
        let graph = load_tsv_edgelist(file.path()).unwrap();
        assert_eq!(graph.num_nodes, 3);
        assert_eq!(graph.num_edges, 3);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let file = write_tsv("# a comment\n\n1\t2\n# another\n2\t3\n");
        let graph = load_tsv_edgelist(file.path()).unwrap();
        assert_eq!(graph.num_nodes, 3);
        assert_eq!(graph.num_edges, 2);
    }

    #[test]
    fn drops_duplicates_and_self_loops() {
        let file = write_tsv("1\t2\n2\t1\n1\t1\n2\t3\n");
        let graph = load_tsv_edgelist(file.path()).unwrap();
        assert_eq!(graph.num_edges, 2);
    }

    #[test]
    fn rejects_malformed_lines() {
        let file = write_tsv("1\t2\nnot-a-node\t3\n");
        let err = load_tsv_edgelist(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_tsv_edgelist(Path::new("/nonexistent/graph.tsv")).is_err());
    }
}
