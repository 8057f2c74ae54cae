//! The SCC-aware worklist fixpoint engine (spec §4.5): propagates
//! transitive capabilities bottom-up with hop-decayed confidence until the
//! lattice saturates, treating SCCs as collapsed nodes.

pub mod decay;

use std::collections::BTreeSet;

use gorisk_core::diagnostics::{Diagnostic, DiagnosticSink};
use gorisk_core::types::capability::CapabilityEvidence;

use crate::callgraph::types::{CSCallGraph, FunctionSummary};
use decay::{multiplier, MAX_DEPTH};

/// Default iteration budget (spec §4.5 `maxIterations`). Chosen generously
/// relative to the lattice's bounded height (9 tags x 4 depth buckets x a
/// handful of confidence buckets) so real graphs converge well under it;
/// exhausting it is a warning, never a failure (spec §7 item 4).
pub const DEFAULT_MAX_ITERATIONS: u32 = 10_000;

#[derive(Debug, Clone, Default)]
pub struct FixpointStats {
    pub iterations: u32,
    pub converged: bool,
}

pub struct FixpointEngine {
    pub max_iterations: u32,
}

impl FixpointEngine {
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self { max_iterations }
    }

    /// Run the fixpoint to convergence (or until `max_iterations` is
    /// exhausted) over `graph`, mutating its `summaries` in place.
    pub fn run(&self, graph: &mut CSCallGraph, diagnostics: &DiagnosticSink) -> FixpointStats {
        self.run_excluding(graph, diagnostics, &BTreeSet::new())
    }

    /// Like [`Self::run`], but nodes in `seeded` start outside the pending
    /// set entirely — their `summaries` entry is taken as already converged
    /// (e.g. pre-populated from the summary cache, spec §4.8) rather than
    /// recomputed from their callees. They are still visited as *callees* of
    /// other pending nodes, and still requeue their own callers the normal
    /// way if reprocessed for any other reason (an SCC containing a seeded
    /// member, for instance, always recomputes the whole component).
    pub fn run_excluding(&self, graph: &mut CSCallGraph, diagnostics: &DiagnosticSink, seeded: &BTreeSet<String>) -> FixpointStats {
        let mut pending: BTreeSet<String> = graph
            .sorted_node_keys()
            .into_iter()
            .filter(|k| !seeded.contains(k))
            .collect();
        let mut iterations: u32 = 0;

        while let Some(key) = pending.iter().next().cloned() {
            if iterations >= self.max_iterations {
                diagnostics.push(Diagnostic::FixpointBudgetExhausted {
                    iterations,
                    pending: pending.len(),
                });
                return FixpointStats {
                    iterations,
                    converged: false,
                };
            }
            pending.remove(&key);
            iterations += 1;

            if let Some(scc_id) = graph.node_to_scc.get(&key).copied() {
                self.process_scc(graph, scc_id, &mut pending);
            } else {
                self.process_node(graph, &key, &mut pending);
            }
        }

        FixpointStats {
            iterations,
            converged: true,
        }
    }

    fn process_scc(&self, graph: &mut CSCallGraph, scc_id: u32, pending: &mut BTreeSet<String>) {
        let members: Vec<String> = graph.sccs[&scc_id].nodes.iter().map(|n| n.key()).collect();
        for m in &members {
            pending.remove(m);
        }

        let mut collapsed: Option<FunctionSummary> = None;
        for m in &members {
            let s = &graph.summaries[m];
            collapsed = Some(match collapsed {
                None => s.clone(),
                Some(mut acc) => {
                    acc.sources.merge(&s.sources);
                    acc.sinks.merge(&s.sinks);
                    acc.sanitizers.merge(&s.sanitizers);
                    acc.effects.merge(&s.effects);
                    acc.transitive.merge(&s.transitive);
                    acc.depth = acc.depth.max(s.depth);
                    acc.confidence = if acc.confidence > 0.0 && s.confidence > 0.0 {
                        acc.confidence.min(s.confidence)
                    } else {
                        acc.confidence.max(s.confidence)
                    };
                    acc
                }
            });
        }
        let mut collapsed = collapsed.expect("SCC must have at least one member");
        collapsed.depth = collapsed.depth.min(MAX_DEPTH);
        collapsed.classify_effects();

        for m in &members {
            let previous = &graph.summaries[m];
            if !previous.converged_eq(&collapsed) {
                let mut updated = collapsed.clone();
                updated.node = previous.node.clone();
                updated.iteration += 1;
                graph.summaries.insert(m.clone(), updated);
                self.requeue_out_of_scc_callers(graph, m, scc_id, pending);
            }
        }
    }

    fn requeue_out_of_scc_callers(&self, graph: &CSCallGraph, key: &str, scc_id: u32, pending: &mut BTreeSet<String>) {
        for caller in graph.callers(key) {
            let caller_key = caller.key();
            if graph.node_to_scc.get(&caller_key).copied() != Some(scc_id) {
                pending.insert(caller_key);
            }
        }
    }

    fn process_node(&self, graph: &mut CSCallGraph, key: &str, pending: &mut BTreeSet<String>) {
        let previous = graph.summaries[key].clone();

        let mut next = FunctionSummary::seed(previous.node.clone(), previous.effects.clone());
        next.iteration = previous.iteration;

        let mut callees: Vec<_> = graph.callees(key).to_vec();
        callees.sort_by(|a, b| a.key().cmp(&b.key()));

        for callee in &callees {
            let callee_key = callee.key();
            let Some(callee_summary) = graph.summaries.get(&callee_key) else {
                continue;
            };
            let new_depth = callee_summary.depth + 1;
            if new_depth > MAX_DEPTH {
                continue;
            }
            let new_conf = callee_summary.confidence * multiplier(new_depth);

            for tag in callee_summary.effects.list().into_iter().chain(callee_summary.transitive.list()) {
                next.transitive
                    .add_with_evidence(tag, CapabilityEvidence::propagated(new_conf));
                next.depth = next.depth.max(new_depth);
                if new_conf > 0.0 {
                    next.confidence = next.confidence.min(new_conf);
                }
            }
        }

        next.classify_effects();

        if !previous.converged_eq(&next) {
            next.iteration += 1;
            graph.summaries.insert(key.to_string(), next);
            for caller in graph.callers(key) {
                pending.insert(caller.key());
            }
        }
    }
}

impl Default for FixpointEngine {
    fn default() -> Self {
        Self::new()
    }
}
