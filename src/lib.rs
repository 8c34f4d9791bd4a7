//! Branch-and-bound and branch-and-price for the maximum clique and graph coloring problems

// #![warn(clippy::all, clippy::pedantic)]
// useful additional warnings if docs are missing, or crates imported but unused, etc.
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unsafe_code)]
#![warn(unused_extern_crates)]
#![warn(variant_size_differences)]

// not sure if already by default in clippy
#![warn(clippy::similar_names)]
#![warn(clippy::shadow_unrelated)]
#![warn(clippy::shadow_same)]


/// error types (input, configuration)
pub mod error;

/// graph model (adjacency storage and queries)
pub mod graph;

/// read DIMACS edge lists
pub mod dimacs;

/// solutions, extractors and checkers
pub mod color;

/// search configuration
pub mod config;

/// independent sets, fingerprints and the excluded-set registry
pub mod independent_set;

/// linear relaxation oracle contract and reference backend
pub mod relaxation;

/// helper and utility methods for executables
pub mod util;

/// heuristics, pricing and tree searches
pub mod search;
