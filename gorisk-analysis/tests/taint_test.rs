//! Taint tracer scenarios: the rule-table HIGH flow, dedup across
//! package/source/sink, and confidence-driven downgrade, exercised through
//! the public `gorisk_analysis` API.

use std::collections::HashSet;

use gorisk_core::diagnostics::DiagnosticSink;
use gorisk_core::types::capability::{Capability, CapabilitySet, RiskLevel};
use gorisk_core::types::ir::{CallEdge, FunctionCaps, IRGraph, Symbol, SymbolKind};

use gorisk_analysis::callgraph::{detect_sccs, CallGraphBuilder};
use gorisk_analysis::fixpoint::FixpointEngine;
use gorisk_analysis::taint::TaintTracer;

fn sym(pkg: &str, name: &str) -> Symbol {
    Symbol::new(pkg, name, SymbolKind::Func)
}

/// Scenario 4: package P with {env, exec} -> exactly one HIGH finding
/// env->exec.
#[test]
fn single_function_env_and_exec_yields_one_high_finding() {
    let mut ir = IRGraph::new();
    let mut caps = CapabilitySet::new();
    caps.add(Capability::Env);
    caps.add(Capability::Exec);
    ir.functions.insert("p.f".into(), FunctionCaps::new(sym("p", "f"), caps));

    let mut graph = CallGraphBuilder::new(0).build(&ir);
    detect_sccs(&mut graph);
    FixpointEngine::new().run(&mut graph, &DiagnosticSink::new());

    let findings = TaintTracer::new().trace(&graph);
    let high: Vec<_> = findings.iter().filter(|f| f.risk == RiskLevel::High).collect();
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].source, Capability::Env);
    assert_eq!(high[0].sink, Capability::Exec);
    assert_eq!(high[0].package, "p");
}

#[test]
fn taint_findings_are_deduplicated_by_package_source_sink() {
    let mut ir = IRGraph::new();
    let mut caps_a = CapabilitySet::new();
    caps_a.add(Capability::Env);
    caps_a.add(Capability::Exec);
    ir.functions.insert("p.f".into(), FunctionCaps::new(sym("p", "f"), caps_a.clone()));
    ir.functions.insert("p.g".into(), FunctionCaps::new(sym("p", "g"), caps_a));

    let mut graph = CallGraphBuilder::new(0).build(&ir);
    detect_sccs(&mut graph);
    FixpointEngine::new().run(&mut graph, &DiagnosticSink::new());

    let findings = TaintTracer::new().trace(&graph);
    let mut seen = HashSet::new();
    for f in &findings {
        assert!(seen.insert(f.dedup_key()), "duplicate finding for {:?}", f.dedup_key());
    }
}

#[test]
fn low_confidence_flow_is_downgraded_one_level() {
    // A long chain pushes confidence below 0.70 even though the rule is
    // HIGH, and the downgrade must land at MEDIUM.
    let mut ir = IRGraph::new();
    ir.functions.insert("p.a".into(), FunctionCaps::new(sym("p", "a"), CapabilitySet::new()));
    let mut env_set = CapabilitySet::new();
    env_set.add(Capability::Env);
    ir.functions.insert("p.b".into(), FunctionCaps::new(sym("p", "b"), env_set));
    let mut exec_set = CapabilitySet::new();
    exec_set.add(Capability::Exec);
    ir.functions.insert("p.c".into(), FunctionCaps::new(sym("p", "c"), exec_set));
    ir.calls.push(CallEdge {
        caller: sym("p", "a"),
        callee: sym("p", "b"),
        file: "f.go".into(),
        line: 1,
        synthetic: false,
    });
    ir.calls.push(CallEdge {
        caller: sym("p", "b"),
        callee: sym("p", "c"),
        file: "f.go".into(),
        line: 2,
        synthetic: false,
    });

    let mut graph = CallGraphBuilder::new(0).build(&ir);
    detect_sccs(&mut graph);
    FixpointEngine::new().run(&mut graph, &DiagnosticSink::new());

    let findings = TaintTracer::new().trace(&graph);
    let a_finding = findings
        .iter()
        .find(|f| f.source_func == "p.a" && f.source == Capability::Env && f.sink == Capability::Exec)
        .expect("p.a should have a downgraded env->exec finding");
    assert!(a_finding.confidence < 0.70);
    assert_eq!(a_finding.risk, RiskLevel::Medium);
}
