//! Tarjan's strongly-connected-components algorithm (spec §4.4), with an
//! explicit stack rather than recursion (call graphs from real projects can
//! be deep enough to blow a native stack). Iterates nodes in sorted order
//! so SCC numbering is a deterministic function of the graph. Records an
//! SCC only when it has more than one member, or a singleton has a
//! self-loop.

use gorisk_core::types::collections::FxHashMap;

use super::types::{CSCallGraph, SCC};

#[derive(Clone, Copy)]
enum Frame {
    /// Visit `key` for the first time.
    Enter(usize),
    /// Finish processing the child edge at `edge_idx` for the node at
    /// `node_idx` on the call stack.
    Continue(usize, usize),
}

/// Runs Tarjan's algorithm over `graph` and populates `graph.sccs` /
/// `graph.node_to_scc`.
pub fn detect_sccs(graph: &mut CSCallGraph) {
    let order = graph.sorted_node_keys();
    let index_of: FxHashMap<String, usize> = order.iter().cloned().enumerate().map(|(i, k)| (k, i)).collect();

    let n = order.len();
    let mut index: Vec<Option<u32>> = vec![None; n];
    let mut lowlink: Vec<u32> = vec![0; n];
    let mut on_stack: Vec<bool> = vec![false; n];
    let mut tarjan_stack: Vec<usize> = Vec::new();
    let mut next_index: u32 = 0;
    let mut next_scc_id: u32 = 0;

    let mut sccs: Vec<SCC> = Vec::new();

    for start in 0..n {
        if index[start].is_some() {
            continue;
        }
        let mut work: Vec<Frame> = vec![Frame::Enter(start)];

        while let Some(frame) = work.pop() {
            match frame {
                Frame::Enter(v) => {
                    index[v] = Some(next_index);
                    lowlink[v] = next_index;
                    next_index += 1;
                    tarjan_stack.push(v);
                    on_stack[v] = true;
                    work.push(Frame::Continue(v, 0));
                }
                Frame::Continue(v, edge_idx) => {
                    let callees = graph.callees(&order[v]);
                    if edge_idx < callees.len() {
                        let callee_key = callees[edge_idx].key();
                        let w = index_of[&callee_key];
                        work.push(Frame::Continue(v, edge_idx + 1));
                        if index[w].is_none() {
                            work.push(Frame::Enter(w));
                        } else if on_stack[w] {
                            lowlink[v] = lowlink[v].min(index[w].expect("visited"));
                        }
                    } else {
                        // All children processed; propagate lowlink to parent
                        // via the caller frame still under us, and pop our
                        // own SCC if we are a root.
                        if let Some(&Frame::Continue(parent, _)) = work.last() {
                            lowlink[parent] = lowlink[parent].min(lowlink[v]);
                        }
                        if lowlink[v] == index[v].expect("visited") {
                            let mut members = Vec::new();
                            loop {
                                let w = tarjan_stack.pop().expect("stack not empty for root");
                                on_stack[w] = false;
                                members.push(w);
                                if w == v {
                                    break;
                                }
                            }
                            let has_self_loop = members.len() == 1
                                && graph
                                    .callees(&order[members[0]])
                                    .iter()
                                    .any(|n| n.key() == order[members[0]]);
                            if members.len() > 1 || has_self_loop {
                                let mut nodes: Vec<_> =
                                    members.iter().map(|&idx| graph.nodes[&order[idx]].clone()).collect();
                                nodes.sort();
                                sccs.push(SCC {
                                    id: next_scc_id,
                                    nodes,
                                });
                                next_scc_id += 1;
                            }
                        }
                    }
                }
            }
        }
    }

    for scc in sccs {
        for node in &scc.nodes {
            graph.node_to_scc.insert(node.key(), scc.id);
        }
        graph.sccs.insert(scc.id, scc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorisk_core::types::ir::{CallEdge, Context, ContextNode, IRGraph, Symbol, SymbolKind};

    use crate::callgraph::builder::CallGraphBuilder;

    fn sym(name: &str) -> Symbol {
        Symbol::new("", name, SymbolKind::Func)
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

    #[test]
    fn node_on_a_cycle_is_in_nodetoscc() {
        // a -> b -> a, a cycle of size 2.
        let mut ir = IRGraph::new();
        use gorisk_core::types::capability::CapabilitySet;
        use gorisk_core::types::ir::FunctionCaps;
        ir.functions.insert(".a".into(), FunctionCaps::new(sym("a"), CapabilitySet::new()));
        ir.functions.insert(".b".into(), FunctionCaps::new(sym("b"), CapabilitySet::new()));
        ir.calls.push(edge("a", "b"));
        ir.calls.push(edge("b", "a"));

        let mut graph = CallGraphBuilder::new(0).build(&ir);
        detect_sccs(&mut graph);

        let a_key = ContextNode::new(sym("a"), Context::Unit).key();
        let b_key = ContextNode::new(sym("b"), Context::Unit).key();
        assert!(graph.node_to_scc.contains_key(&a_key));
        assert!(graph.node_to_scc.contains_key(&b_key));
        assert_eq!(graph.node_to_scc[&a_key], graph.node_to_scc[&b_key]);
    }

    #[test]
    fn acyclic_chain_has_no_sccs() {
        let mut ir = IRGraph::new();
        use gorisk_core::types::capability::CapabilitySet;
        use gorisk_core::types::ir::FunctionCaps;
        ir.functions.insert(".a".into(), FunctionCaps::new(sym("a"), CapabilitySet::new()));
        ir.functions.insert(".b".into(), FunctionCaps::new(sym("b"), CapabilitySet::new()));
        ir.functions.insert(".c".into(), FunctionCaps::new(sym("c"), CapabilitySet::new()));
        ir.calls.push(edge("a", "b"));
        ir.calls.push(edge("b", "c"));

        let mut graph = CallGraphBuilder::new(0).build(&ir);
        detect_sccs(&mut graph);
        assert!(graph.sccs.is_empty());
        assert!(graph.node_to_scc.is_empty());
    }

    #[test]
    fn singleton_self_loop_is_recorded() {
        let mut ir = IRGraph::new();
        use gorisk_core::types::capability::CapabilitySet;
        use gorisk_core::types::ir::FunctionCaps;
        ir.functions.insert(".a".into(), FunctionCaps::new(sym("a"), CapabilitySet::new()));
        ir.calls.push(edge("a", "a"));

        let mut graph = CallGraphBuilder::new(0).build(&ir);
        detect_sccs(&mut graph);
        let a_key = ContextNode::new(sym("a"), Context::Unit).key();
        assert!(graph.node_to_scc.contains_key(&a_key));
        let scc = graph.scc_of(&a_key).unwrap();
        assert_eq!(scc.nodes.len(), 1);
    }

    #[test]
    fn singleton_without_self_loop_is_not_recorded() {
        let mut ir = IRGraph::new();
        use gorisk_core::types::capability::CapabilitySet;
        use gorisk_core::types::ir::FunctionCaps;
        ir.functions.insert(".a".into(), FunctionCaps::new(sym("a"), CapabilitySet::new()));
        ir.calls.push(edge("a", "b")); // dangling, b never defined
        let mut graph = CallGraphBuilder::new(0).build(&ir);
        detect_sccs(&mut graph);
        let a_key = ContextNode::new(sym("a"), Context::Unit).key();
        assert!(!graph.node_to_scc.contains_key(&a_key));
    }

    #[test]
    fn numbering_is_deterministic_across_runs() {
        let mut ir = IRGraph::new();
        use gorisk_core::types::capability::CapabilitySet;
        use gorisk_core::types::ir::FunctionCaps;
        for name in ["a", "b", "c", "d"] {
            ir.functions.insert(format!(".{name}"), FunctionCaps::new(sym(name), CapabilitySet::new()));
        }
        ir.calls.push(edge("a", "b"));
        ir.calls.push(edge("b", "a"));
        ir.calls.push(edge("c", "d"));
        ir.calls.push(edge("d", "c"));

        let mut g1 = CallGraphBuilder::new(0).build(&ir);
        detect_sccs(&mut g1);
        let mut g2 = CallGraphBuilder::new(0).build(&ir);
        detect_sccs(&mut g2);

        let mut ids1: Vec<u32> = g1.sccs.keys().copied().collect();
        ids1.sort();
        let mut ids2: Vec<u32> = g2.sccs.keys().copied().collect();
        ids2.sort();
        assert_eq!(ids1, ids2);
        for id in ids1 {
            assert_eq!(g1.sccs[&id].nodes, g2.sccs[&id].nodes);
        }
    }
}
