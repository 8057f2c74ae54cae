//! Wires the call-graph builder, SCC detector, fixpoint engine, taint
//! tracer, and policy gate into a single scan (spec §2/§4), the way
//! `drift-analysis::engine` sequences its stages. This is the entry point
//! `gorisk-cli` drives; nothing here is itself an external collaborator.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::info_span;

use gorisk_core::diagnostics::{Diagnostic, DiagnosticSink};
use gorisk_core::frontend::RawIr;
use gorisk_core::health::HealthProvider;
use gorisk_core::types::capability::CapabilitySet;
use gorisk_core::types::ir::IRGraph;
use gorisk_core::vuln::VulnProvider;
use gorisk_core::PolicyFile;

use crate::cache::{cached_to_summary, key::hash_value, CacheKey, CachedSummary, SummaryCache};
use crate::callgraph::{CallGraphBuilder, CSCallGraph};
use crate::fixpoint::FixpointEngine;
use crate::ir::from_raw_ir;
use crate::policy::{run_gate, GateVerdict, PackageInput};
use crate::taint::TaintTracer;

/// Per-stage wall-clock timing, surfaced by `--timings` (mirrors the
/// teacher's `CallGraphStats::build_duration`).
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    pub consolidate: Duration,
    pub build_call_graph: Duration,
    pub detect_sccs: Duration,
    pub cache_lookup: Duration,
    pub run_fixpoint: Duration,
    pub cache_write: Duration,
    pub trace_taint: Duration,
    pub gate: Duration,
}

pub struct ScanReport {
    pub graph: CSCallGraph,
    pub verdict: GateVerdict,
    pub timings: PipelineTimings,
    pub fixpoint_iterations: u32,
    pub fixpoint_converged: bool,
    /// `(hits, misses)` for this run's summary-cache lookups, `None` when no
    /// cache was configured (spec §4.8).
    pub cache_stats: Option<(u64, u64)>,
}

/// Context-sensitivity width for the call-graph builder (spec §4.3: `k=0`
/// unit context, `k=1` single-caller context, `k>=2` falls back to `k=1`).
pub struct PipelineConfig {
    pub k: u32,
    /// The persistent function-summary cache (spec §4.8). `None` disables
    /// caching entirely; the pipeline then behaves exactly as it did before
    /// the cache existed.
    pub cache: Option<Arc<SummaryCache>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { k: 1, cache: None }
    }
}

/// Builds the cache key for `key` from the call graph's already-seeded
/// direct effects (spec §4.8: `directCaps` hash plus sorted callee
/// summary hashes). Computed right after the graph is built, before the
/// fixpoint has run, so "callee hashes" here are each direct callee's own
/// *direct* capability hash — sufficient to invalidate on a direct-caps
/// change or call-site rewiring; a change several hops away that doesn't
/// touch any direct callee's own capabilities or this function's own code
/// is not detected by this key alone, an accepted simplification (spec §9:
/// "pick one, document it"). `codeHash` degenerates to a name-only hash
/// since this reference pipeline's front end (`gorisk-cli`'s JSON fixture)
/// does not surface source file contents; a real per-language front end
/// would pass the function's backing file(s) here instead.
fn build_cache_key(graph: &CSCallGraph, key: &str) -> CacheKey {
    let node = &graph.nodes[key];
    let summary = &graph.summaries[key];
    let direct_caps_hash = hash_value(&summary.effects);

    let mut callees: Vec<_> = graph.callees(key).to_vec();
    callees.sort_by(|a, b| a.key().cmp(&b.key()));
    let callee_hashes: Vec<String> = callees
        .iter()
        .map(|c| {
            graph
                .summaries
                .get(&c.key())
                .map(|s| hash_value(&s.effects))
                .unwrap_or_default()
        })
        .collect();

    CacheKey {
        function: node.function.clone(),
        context: node.context.clone(),
        direct_caps_hash,
        callee_hashes,
        code_hash: crate::cache::key::code_hash(&[(node.function.rendered(), None)]),
    }
}

/// Attempts a cache lookup for every non-SCC node (spec §4.8 is silent on
/// cyclic groups; this pipeline caches only acyclic functions, since a
/// cycle's members only have a stable summary as a collapsed group rather
/// than individually — see `fixpoint::process_scc`). Returns the seeded
/// `(key, summary)` pairs to apply before the fixpoint runs.
fn cache_lookup_pass(graph: &CSCallGraph, cache: &SummaryCache, diagnostics: &DiagnosticSink) -> Vec<(String, crate::callgraph::FunctionSummary)> {
    let mut hits = Vec::new();
    for key in graph.sorted_node_keys() {
        if graph.node_to_scc.contains_key(&key) {
            continue;
        }
        let node = graph.nodes[&key].clone();
        let cache_key = build_cache_key(graph, &key);
        if let Some(cached) = cache.get(&node.function.package, &node.function.name, &cache_key, diagnostics) {
            hits.push((key, cached_to_summary(node, &cached)));
        }
    }
    hits
}

/// Writes back every freshly-computed (non-cache-hit, non-SCC) node's
/// converged summary.
fn cache_write_pass(graph: &CSCallGraph, seeded: &BTreeSet<String>, cache: &SummaryCache, diagnostics: &DiagnosticSink) {
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    for key in graph.sorted_node_keys() {
        if seeded.contains(&key) || graph.node_to_scc.contains_key(&key) {
            continue;
        }
        let node = &graph.nodes[&key];
        let summary = &graph.summaries[&key];
        let cache_key = build_cache_key(graph, &key);
        let cached_summary = CachedSummary::from(summary);
        cache.put(&node.function.package, &node.function.name, &cache_key, &cached_summary, timestamp, diagnostics);
    }
}

/// Runs the full analysis pipeline over already-consolidated IR and
/// produces a gated report. `packages` lists every package name present in
/// `ir`, used to build the per-package gate inputs.
pub fn run_pipeline(
    ir: &IRGraph,
    policy: &PolicyFile,
    health: &dyn HealthProvider,
    vuln: &dyn VulnProvider,
    config: &PipelineConfig,
    diagnostics: &DiagnosticSink,
    today: &str,
) -> ScanReport {
    let mut timings = PipelineTimings::default();

    let build_span = info_span!("build_call_graph", functions = ir.functions.len(), edges = ir.calls.len());
    let t0 = Instant::now();
    let mut graph = build_span.in_scope(|| CallGraphBuilder::new(config.k).build(ir));
    timings.build_call_graph = t0.elapsed();

    let scc_span = info_span!("detect_sccs", nodes = graph.summaries.len());
    let t1 = Instant::now();
    scc_span.in_scope(|| crate::callgraph::detect_sccs(&mut graph));
    timings.detect_sccs = t1.elapsed();

    let mut cached_hits: BTreeSet<String> = BTreeSet::new();
    if let Some(cache) = &config.cache {
        let lookup_span = info_span!("cache_lookup", nodes = graph.summaries.len());
        let t1b = Instant::now();
        let hits = lookup_span.in_scope(|| cache_lookup_pass(&graph, cache, diagnostics));
        timings.cache_lookup = t1b.elapsed();
        for (key, summary) in hits {
            cached_hits.insert(key.clone());
            graph.summaries.insert(key, summary);
        }
    }

    let fixpoint_span = info_span!("run_fixpoint", sccs = graph.sccs.len(), iterations = tracing::field::Empty);
    let t2 = Instant::now();
    let stats = fixpoint_span.in_scope(|| FixpointEngine::new().run_excluding(&mut graph, diagnostics, &cached_hits));
    timings.run_fixpoint = t2.elapsed();
    fixpoint_span.record("iterations", stats.iterations);

    let mut cache_stats = None;
    if let Some(cache) = &config.cache {
        let write_span = info_span!("cache_write", nodes = graph.summaries.len());
        let t2b = Instant::now();
        write_span.in_scope(|| cache_write_pass(&graph, &cached_hits, cache, diagnostics));
        timings.cache_write = t2b.elapsed();

        let (hits, misses) = cache.stats();
        if hits + misses > 0 {
            diagnostics.push(Diagnostic::CacheStats { hits, misses });
        }
        cache_stats = Some((hits, misses));
    }

    let taint_span = info_span!("trace_taint", functions = graph.summaries.len());
    let t3 = Instant::now();
    let findings = taint_span.in_scope(|| TaintTracer::new().trace(&graph));
    timings.trace_taint = t3.elapsed();

    let packages = collect_packages(&graph);

    let gate_span = info_span!("gate", packages = packages.len());
    let t4 = Instant::now();
    let verdict = gate_span.in_scope(|| {
        run_gate(policy, packages_with_findings(packages, &findings), health, vuln, diagnostics, today)
    });
    timings.gate = t4.elapsed();

    ScanReport {
        graph,
        verdict,
        timings,
        fixpoint_iterations: stats.iterations,
        fixpoint_converged: stats.converged,
        cache_stats,
    }
}

/// Consolidates raw per-package IR (spec §6) and runs the pipeline over
/// the result, recording the consolidation step's own timing.
pub fn run_pipeline_from_raw_ir(
    raw: &RawIr,
    policy: &PolicyFile,
    health: &dyn HealthProvider,
    vuln: &dyn VulnProvider,
    config: &PipelineConfig,
    diagnostics: &DiagnosticSink,
    today: &str,
) -> (ScanReport, Duration) {
    let t0 = Instant::now();
    let ir = from_raw_ir(raw);
    let consolidate_time = t0.elapsed();
    let mut report = run_pipeline(&ir, policy, health, vuln, config, diagnostics, today);
    report.timings.consolidate = consolidate_time;
    (report, consolidate_time)
}

/// Aggregates converged capabilities per package: direct caps are the
/// union of every node's `effects` in that package, transitive caps the
/// union of every node's `transitive`, depth the max depth observed.
fn collect_packages(graph: &CSCallGraph) -> Vec<PackageInput> {
    use gorisk_core::types::collections::FxHashMap;

    struct Acc {
        direct: CapabilitySet,
        transitive: CapabilitySet,
        depth: u32,
    }

    let mut by_package: FxHashMap<String, Acc> = FxHashMap::default();
    for key in graph.sorted_node_keys() {
        let summary = &graph.summaries[&key];
        let package = summary.node.function.package.clone();
        let entry = by_package.entry(package).or_insert_with(|| Acc {
            direct: CapabilitySet::new(),
            transitive: CapabilitySet::new(),
            depth: 0,
        });
        entry.direct.merge(&summary.effects);
        entry.transitive.merge(&summary.transitive);
        entry.depth = entry.depth.max(summary.depth);
    }

    let mut names: Vec<&String> = by_package.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| {
            let acc = &by_package[name];
            PackageInput {
                package: name.clone(),
                direct: acc.direct.clone(),
                transitive: acc.transitive.clone(),
                transitive_depth: acc.depth,
                taint_findings: Vec::new(),
            }
        })
        .collect()
}

fn packages_with_findings(
    mut packages: Vec<PackageInput>,
    findings: &[gorisk_core::types::taint::TaintFinding],
) -> Vec<PackageInput> {
    for pkg in &mut packages {
        pkg.taint_findings = findings.iter().filter(|f| f.package == pkg.package).cloned().collect();
    }
    packages
}
