//! Input data loading

pub mod tsv;

pub use tsv::load_tsv_edgelist;
