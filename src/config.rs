//! Configuration management for the clustering engine

/// Default configuration for a clustering run
pub struct Config {
    /// Minimum k value for emitted clusters
    pub min_k: u32,

    /// Number of worker threads (0 = use all available cores)
    pub threads: usize,

    /// Score clusters with the exact modularity formula instead of the
    /// constant sentinel
    pub exact_modularity: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_k: 0,
            threads: 0,
            exact_modularity: false,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(min_k: u32, threads: usize, exact_modularity: bool) -> Self {
        Self {
            min_k,
            threads,
            exact_modularity,
        }
    }
}
