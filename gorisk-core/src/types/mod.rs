//! The data model (spec §3): the capability lattice, the IR the front
//! ends deliver, the taint finding shape, and the fast collection aliases
//! used to index all of it.

pub mod capability;
pub mod collections;
pub mod ir;
pub mod taint;

pub use capability::{Capability, CapabilityEvidence, CapabilitySet, RiskLevel, Role, Via};
pub use ir::{CallEdge, Context, ContextNode, FunctionCaps, IRGraph, Symbol, SymbolKind};
pub use taint::TaintFinding;
