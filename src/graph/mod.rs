//! Graph representation and core decomposition

pub mod store;
pub mod builder;
pub mod kcore;
pub mod components;

pub use store::Graph;
pub use builder::GraphBuilder;
pub use kcore::{compute_kcore_decomposition, KCoreResult};
