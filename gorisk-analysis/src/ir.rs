//! IR consumption (spec §4.2). The `IRGraph` type and its `consolidate`
//! helper are defined in `gorisk_core::types::ir` (the foundation crate
//! owns the data model); this module re-exports them under the name the
//! spec's component list uses, and adds the one piece of glue the analyzer
//! itself needs: turning a front end's [`RawIr`] into a consolidated
//! [`IRGraph`].

pub use gorisk_core::types::ir::{
    consolidate, CallEdge, Context, ContextNode, FunctionCaps, IRGraph, Symbol, SymbolKind,
};
use gorisk_core::frontend::RawIr;

/// Consolidate a front end's raw two-collection IR into a flat, merged
/// [`IRGraph`]. Packages are iterated in sorted order (spec §4.2).
pub fn from_raw_ir(raw: &RawIr) -> IRGraph {
    consolidate(&raw.per_package_functions, &raw.per_package_edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorisk_core::types::capability::{Capability, CapabilitySet};
    use gorisk_core::types::collections::FxHashMap;
    use gorisk_core::types::ir::{FunctionCaps, Symbol, SymbolKind};

    #[test]
    fn from_raw_ir_flattens_per_package_maps() {
        let mut functions = FxHashMap::default();
        let mut pkg_fns = FxHashMap::default();
        let mut caps = CapabilitySet::new();
        caps.add(Capability::Exec);
        pkg_fns.insert(
            "left-pad.pad".to_string(),
            FunctionCaps::new(Symbol::new("left-pad", "pad", SymbolKind::Func), caps),
        );
        functions.insert("left-pad".to_string(), pkg_fns);

        let raw = RawIr {
            per_package_functions: functions,
            per_package_edges: FxHashMap::default(),
        };

        let graph = from_raw_ir(&raw);
        assert!(graph.function("left-pad.pad").is_some());
    }
}
