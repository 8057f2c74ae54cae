//! # gorisk-analysis
//!
//! The analysis engine for the gorisk capability & taint analyzer. Contains
//! the context-sensitive call graph builder, the SCC detector, the
//! SCC-aware fixpoint engine, the interprocedural taint tracer, the policy
//! gate and composite scorer, and the persistent function-summary cache.

#![allow(clippy::too_many_arguments)]

pub mod cache;
pub mod callgraph;
pub mod fixpoint;
pub mod ir;
pub mod pipeline;
pub mod policy;
pub mod taint;

pub use gorisk_core::types::capability;
