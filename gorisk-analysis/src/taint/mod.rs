//! The interprocedural taint tracer (spec §4.6): for every converged node,
//! checks the closed source/sink rule table, then BFSes forward through
//! the call graph to materialize a concrete call-path flow.

pub mod rules;

use std::collections::{HashSet, VecDeque};

use gorisk_core::types::capability::{Capability, RiskLevel};
use gorisk_core::types::taint::TaintFinding;

use crate::callgraph::types::{CSCallGraph, FunctionSummary};
use rules::RULES;

/// `true` if `cap` is present in `summary`'s `direct_set ∪ transitive`
/// (spec §4.6's "source in sources ∪ transitive" / "sink in sinks ∪
/// transitive").
fn has_in_role_or_transitive(summary: &FunctionSummary, direct: &gorisk_core::types::capability::CapabilitySet, cap: Capability) -> bool {
    direct.has(cap) || summary.transitive.has(cap)
}

/// `min(confidence(source), confidence(sink))`, looking at whichever of
/// the direct/transitive sets actually carries the capability.
fn combined_confidence(summary: &FunctionSummary, direct: &gorisk_core::types::capability::CapabilitySet, cap: Capability) -> f64 {
    direct.confidence(cap).max(summary.transitive.confidence(cap))
}

pub struct TaintTracer;

impl TaintTracer {
    pub fn new() -> Self {
        Self
    }

    /// Run the tracer over every node in `graph`, returning deduplicated,
    /// sorted findings.
    pub fn trace(&self, graph: &CSCallGraph) -> Vec<TaintFinding> {
        let mut findings: Vec<TaintFinding> = Vec::new();

        for key in graph.sorted_node_keys() {
            let summary = &graph.summaries[&key];
            for rule in RULES {
                let has_source = has_in_role_or_transitive(summary, &summary.sources, rule.source);
                let has_sink = has_in_role_or_transitive(summary, &summary.sinks, rule.sink);
                if !has_source || !has_sink {
                    continue;
                }

                let conf = combined_confidence(summary, &summary.sources, rule.source)
                    .min(combined_confidence(summary, &summary.sinks, rule.sink));

                let (sink_func, call_stack, sanitized) = self.bfs_to_sink(graph, &key, rule.sink);

                let mut risk = rule.risk;
                if conf < 0.70 {
                    risk = risk.downgrade();
                }

                findings.push(TaintFinding {
                    package: summary.node.function.package.clone(),
                    module: summary.node.function.rendered(),
                    rule_id: rule.id.to_string(),
                    source: rule.source,
                    sink: rule.sink,
                    risk,
                    note: format!(
                        "{} flows into {}{}",
                        rule.source,
                        rule.sink,
                        if sanitized { " (sanitized via crypto on the traced path)" } else { "" }
                    ),
                    confidence: conf,
                    evidence_chain: vec![format!("{} -> {}", rule.source, rule.sink)],
                    source_func: summary.node.function.rendered(),
                    sink_func,
                    call_stack,
                });
            }
        }

        self.dedup_and_sort(findings)
    }

    /// BFS forward from `start_key` through `edges`. Returns
    /// `(sink_function_name, call_stack, sanitized)`. If no downstream node
    /// carries `sink` directly, the finding is anchored at `start_key`
    /// itself with an empty call stack.
    fn bfs_to_sink(&self, graph: &CSCallGraph, start_key: &str, sink: Capability) -> (String, Vec<String>, bool) {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start_key.to_string());
        let mut queue: VecDeque<(String, Vec<String>)> = VecDeque::new();
        queue.push_back((start_key.to_string(), Vec::new()));

        let mut any_crypto_on_path = graph.summaries[start_key].sanitizers.has(Capability::Crypto);

        while let Some((key, path)) = queue.pop_front() {
            if !path.is_empty() {
                if let Some(summary) = graph.summaries.get(&key) {
                    if summary.sinks.has(sink) {
                        let sanitized = any_crypto_on_path || summary.sanitizers.has(Capability::Crypto);
                        return (summary.node.function.rendered(), path, sanitized);
                    }
                }
            }

            let mut callees: Vec<_> = graph.callees(&key).to_vec();
            callees.sort_by(|a, b| a.key().cmp(&b.key()));
            for callee in callees {
                let callee_key = callee.key();
                if visited.insert(callee_key.clone()) {
                    if let Some(summary) = graph.summaries.get(&callee_key) {
                        if summary.sanitizers.has(Capability::Crypto) {
                            any_crypto_on_path = true;
                        }
                    }
                    let mut next_path = path.clone();
                    next_path.push(callee.function.rendered());
                    queue.push_back((callee_key, next_path));
                }
            }
        }

        let start_summary = &graph.summaries[start_key];
        (
            start_summary.node.function.rendered(),
            Vec::new(),
            start_summary.sanitizers.has(Capability::Crypto),
        )
    }

    fn dedup_and_sort(&self, findings: Vec<TaintFinding>) -> Vec<TaintFinding> {
        let mut seen: HashSet<(String, Capability, Capability)> = HashSet::new();
        let mut out: Vec<TaintFinding> = Vec::new();
        for finding in findings {
            if seen.insert(finding.dedup_key()) {
                out.push(finding);
            }
        }
        out.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        out
    }
}

impl Default for TaintTracer {
    fn default() -> Self {
        Self::new()
    }
}

// The rule-table HIGH-finding, dedup, and confidence-downgrade scenarios
// live in `gorisk-analysis/tests/taint_test.rs`, exercised through the
// public API.
