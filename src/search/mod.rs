//! Targeted k-core queries

pub mod maximal;
pub mod minimum;

pub use maximal::{find_maximal_kcore, find_maximal_kcore_cached, MaximalKCore};
pub use minimum::{
    find_minimum_kcore, find_minimum_kcore_cached, find_minimum_kcore_containing,
    find_minimum_kcore_containing_cached, MinimumKCore,
};
