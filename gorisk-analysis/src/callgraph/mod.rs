//! The context-sensitive call graph (spec §4.3/§4.4): construction via
//! worklist BFS (k-CFA) and strongly-connected-component detection via
//! Tarjan's algorithm.

pub mod builder;
pub mod scc;
pub mod types;

pub use builder::{CallGraphBuilder, K};
pub use scc::detect_sccs;
pub use types::{CSCallGraph, FunctionSummary, SCC};
