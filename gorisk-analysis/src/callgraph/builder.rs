//! Context-sensitive call-graph builder (spec §4.3): a k-CFA graph built
//! from the IR by worklist BFS from entry functions.
//!
//! Determinism is load-bearing here (spec §9): entries, callee lists, and
//! worklist pops are all processed in sorted order so that re-running the
//! builder on the same IR yields an identical graph.

use std::collections::VecDeque;

use gorisk_core::types::collections::FxHashMap;
use gorisk_core::types::ir::{CallEdge, Context, ContextNode, IRGraph, Symbol};

use super::types::{CSCallGraph, FunctionSummary};

/// Context width. `k=0` uses the unit context for every node; `k>=1`
/// distinguishes by immediate caller. `k>=2` is accepted but treated as 1
/// (spec §3: "k>=2 is reserved but may fall back to k=1").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct K(pub u32);

impl K {
    fn effective(self) -> u32 {
        self.0.min(1)
    }
}

pub struct CallGraphBuilder {
    pub k: K,
}

impl CallGraphBuilder {
    pub fn new(k: u32) -> Self {
        Self { k: K(k) }
    }

    /// Build the context-sensitive call graph from an [`IRGraph`].
    pub fn build(&self, ir: &IRGraph) -> CSCallGraph {
        let caller_edges = invert_calls(ir);
        let entries = entry_functions(ir, &caller_edges);

        let mut graph = CSCallGraph::new();
        let mut visited: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut queue: VecDeque<(Symbol, Context)> = VecDeque::new();

        for entry in entries {
            queue.push_back((entry, Context::Unit));
        }

        while let Some((symbol, ctx)) = queue.pop_front() {
            let node = ContextNode::new(symbol.clone(), ctx.clone());
            let key = node.key();
            if visited.contains(&key) {
                continue;
            }
            visited.insert(key.clone());
            graph.add_node(node.clone());

            let direct_caps = ir
                .function(&symbol.rendered())
                .map(|f| f.direct_caps.clone())
                .unwrap_or_default();
            graph
                .summaries
                .insert(key.clone(), FunctionSummary::seed(node.clone(), direct_caps));

            let mut edges: Vec<&CallEdge> = caller_edges
                .get(&symbol.rendered())
                .map(|v| v.iter().collect())
                .unwrap_or_default();
            edges.sort_by(|a, b| a.callee.rendered().cmp(&b.callee.rendered()).then(a.line.cmp(&b.line)));

            for edge in edges {
                let new_ctx = if self.k.effective() == 0 {
                    Context::Unit
                } else {
                    Context::Caller(symbol.clone())
                };
                let callee_node = ContextNode::new(edge.callee.clone(), new_ctx.clone());
                let callee_key = callee_node.key();
                graph.add_edge(node.clone(), callee_node);

                if !visited.contains(&callee_key) {
                    queue.push_back((edge.callee.clone(), new_ctx));
                }
            }
        }

        graph
    }
}

impl Default for CallGraphBuilder {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Inverts `calls` into a `caller (rendered symbol) -> [CallEdge]` map,
/// sorted for deterministic iteration.
fn invert_calls(ir: &IRGraph) -> FxHashMap<String, Vec<CallEdge>> {
    let mut by_caller: FxHashMap<String, Vec<CallEdge>> = FxHashMap::default();
    for edge in &ir.calls {
        by_caller.entry(edge.caller.rendered()).or_default().push(edge.clone());
    }
    for edges in by_caller.values_mut() {
        edges.sort_by(|a, b| a.callee.rendered().cmp(&b.callee.rendered()).then(a.line.cmp(&b.line)));
    }
    by_caller
}

/// Entry functions (spec §4.3): functions that call something but are
/// never called themselves, or functions named `main`/`init`. If none are
/// found, every function is treated as an entry.
fn entry_functions(ir: &IRGraph, caller_edges: &FxHashMap<String, Vec<CallEdge>>) -> Vec<Symbol> {
    let mut called: std::collections::HashSet<String> = std::collections::HashSet::new();
    for edge in &ir.calls {
        called.insert(edge.callee.rendered());
    }

    let mut keys: Vec<&String> = ir.functions.keys().collect();
    keys.sort();

    let mut entries: Vec<Symbol> = Vec::new();
    for key in &keys {
        let func = &ir.functions[*key];
        let calls_something = caller_edges.contains_key(&func.symbol.rendered());
        let never_called = !called.contains(&func.symbol.rendered());
        let is_named_entry = func.symbol.name == "main" || func.symbol.name == "init";
        if (calls_something && never_called) || is_named_entry {
            entries.push(func.symbol.clone());
        }
    }

    if entries.is_empty() {
        entries = keys.iter().map(|k| ir.functions[*k].symbol.clone()).collect();
    }

    entries.sort();
    entries.dedup();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorisk_core::types::capability::{Capability, CapabilitySet};
    use gorisk_core::types::ir::{FunctionCaps, SymbolKind};

    fn sym(name: &str) -> Symbol {
        Symbol::new("", name, SymbolKind::Func)
    }

    fn func(name: &str, caps: &[Capability]) -> FunctionCaps {
        let mut set = CapabilitySet::new();
        for c in caps {
            set.add(*c);
        }
        FunctionCaps::new(sym(name), set)
    }

    fn edge(caller: &str, callee: &str) -> CallEdge {
        CallEdge {
            caller: sym(caller),
            callee: sym(callee),
            file: "f.go".into(),
            line: 1,
            synthetic: false,
        }
    }

    fn linear_chain_ir() -> IRGraph {
        let mut ir = IRGraph::new();
        ir.functions.insert(".a".into(), func("a", &[]));
        ir.functions.insert(".b".into(), func("b", &[]));
        ir.functions.insert(".c".into(), func("c", &[Capability::Exec]));
        ir.calls.push(edge("a", "b"));
        ir.calls.push(edge("b", "c"));
        ir
    }

    #[test]
    fn builder_is_deterministic() {
        let ir = linear_chain_ir();
        let builder = CallGraphBuilder::new(1);
        let g1 = builder.build(&ir);
        let g2 = builder.build(&ir);
        assert_eq!(g1.sorted_node_keys(), g2.sorted_node_keys());
    }

    #[test]
    fn every_node_has_a_summary_after_build() {
        let ir = linear_chain_ir();
        let builder = CallGraphBuilder::new(1);
        let graph = builder.build(&ir);
        for key in graph.sorted_node_keys() {
            assert!(graph.summaries.contains_key(&key), "missing summary for {key}");
        }
    }

    #[test]
    fn entry_detection_falls_back_to_main() {
        let mut ir = IRGraph::new();
        ir.functions.insert(".main".into(), func("main", &[]));
        ir.functions.insert(".helper".into(), func("helper", &[]));
        ir.calls.push(edge("main", "helper"));
        let caller_edges = invert_calls(&ir);
        let entries = entry_functions(&ir, &caller_edges);
        assert!(entries.iter().any(|s| s.name == "main"));
    }

    #[test]
    fn k0_collapses_all_contexts_to_unit() {
        let ir = linear_chain_ir();
        let builder = CallGraphBuilder::new(0);
        let graph = builder.build(&ir);
        for key in graph.sorted_node_keys() {
            assert!(key.ends_with('@'), "k=0 context must be unit, got {key}");
        }
    }

    #[test]
    fn k_ge_2_falls_back_to_k1() {
        let ir = linear_chain_ir();
        let g1 = CallGraphBuilder::new(1).build(&ir);
        let g2 = CallGraphBuilder::new(7).build(&ir);
        assert_eq!(g1.sorted_node_keys(), g2.sorted_node_keys());
    }
}
