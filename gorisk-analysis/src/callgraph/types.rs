//! The context-sensitive call graph data model (spec §3): `FunctionSummary`,
//! `SCC`, and `CSCallGraph` itself.

use gorisk_core::types::capability::CapabilitySet;
use gorisk_core::types::collections::{sorted_keys, FxHashMap};
use gorisk_core::types::ir::{CallEdge, ContextNode};

/// The fixpoint lattice element (spec §3). `sources ∪ sinks ∪ sanitizers ⊆
/// effects` is maintained by [`FunctionSummary::classify_effects`], which
/// every writer of `effects` must call before reading the three role sets.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSummary {
    pub node: ContextNode,
    pub sources: CapabilitySet,
    pub sinks: CapabilitySet,
    pub sanitizers: CapabilitySet,
    pub effects: CapabilitySet,
    pub transitive: CapabilitySet,
    pub depth: u32,
    pub confidence: f64,
    pub call_stack: Vec<CallEdge>,
    pub iteration: u32,
}

impl FunctionSummary {
    pub fn seed(node: ContextNode, direct_caps: CapabilitySet) -> Self {
        let mut summary = Self {
            node,
            sources: CapabilitySet::new(),
            sinks: CapabilitySet::new(),
            sanitizers: CapabilitySet::new(),
            effects: direct_caps,
            transitive: CapabilitySet::new(),
            depth: 0,
            confidence: 1.0,
            call_stack: Vec::new(),
            iteration: 0,
        };
        summary.classify_effects();
        summary
    }

    /// Re-derive `sources`/`sinks`/`sanitizers` from `effects` alone (spec
    /// §4.5: "classify its effects into sources/sinks/sanitizers"). This is
    /// deliberately *not* widened to include `transitive` — the taint
    /// tracer (spec §4.6) checks `sources ∪ transitive` / `sinks ∪
    /// transitive` itself, which would be redundant if these three sets
    /// already folded transitive in.
    pub fn classify_effects(&mut self) {
        use gorisk_core::types::capability::{classify, Role};

        self.sources = CapabilitySet::new();
        self.sinks = CapabilitySet::new();
        self.sanitizers = CapabilitySet::new();

        for cap in self.effects.list() {
            match classify(cap) {
                Role::Source => self.sources.add(cap),
                Role::Sink => self.sinks.add(cap),
                Role::Sanitizer => self.sanitizers.add(cap),
                Role::None => {}
            }
        }
    }

    /// Convergence equality (spec §4.5): set-equality on the capability
    /// *keys* of all five sets (evidence list length does not count),
    /// `depth`, and `confidence` modulo `epsilon = 0.001`.
    pub fn converged_eq(&self, other: &FunctionSummary) -> bool {
        const EPSILON: f64 = 0.001;
        self.sources.list() == other.sources.list()
            && self.sinks.list() == other.sinks.list()
            && self.sanitizers.list() == other.sanitizers.list()
            && self.effects.list() == other.effects.list()
            && self.transitive.list() == other.transitive.list()
            && self.depth == other.depth
            && (self.confidence - other.confidence).abs() < EPSILON
    }
}

/// `{id, nodes}` — a strongly connected component. Singletons are recorded
/// only when the node has a self-loop (spec §4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct SCC {
    pub id: u32,
    pub nodes: Vec<ContextNode>,
}

/// The context-sensitive call graph (spec §3). All maps are keyed by
/// [`ContextNode::key`].
#[derive(Debug, Clone, Default)]
pub struct CSCallGraph {
    pub nodes: FxHashMap<String, ContextNode>,
    pub edges: FxHashMap<String, Vec<ContextNode>>,
    pub reverse_edges: FxHashMap<String, Vec<ContextNode>>,
    pub summaries: FxHashMap<String, FunctionSummary>,
    pub sccs: FxHashMap<u32, SCC>,
    pub node_to_scc: FxHashMap<String, u32>,
}

impl CSCallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: ContextNode) {
        self.nodes.entry(node.key()).or_insert(node);
    }

    /// Adds `from -> to` to `edges` and the transposed entry to
    /// `reverse_edges`, maintaining the invariant that `reverse_edges` is
    /// exactly the transpose of `edges`.
    pub fn add_edge(&mut self, from: ContextNode, to: ContextNode) {
        let from_key = from.key();
        let to_key = to.key();
        self.add_node(from);
        self.add_node(to.clone());
        let out = self.edges.entry(from_key.clone()).or_default();
        if !out.iter().any(|n| n.key() == to_key) {
            out.push(to.clone());
        }
        let back = self.reverse_edges.entry(to_key).or_default();
        if !back.iter().any(|n| n.key() == from_key) {
            back.push(self.nodes[&from_key].clone());
        }
    }

    pub fn callees(&self, key: &str) -> &[ContextNode] {
        self.edges.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn callers(&self, key: &str) -> &[ContextNode] {
        self.reverse_edges.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All node keys, sorted (spec §4.3/§9 determinism requirement).
    pub fn sorted_node_keys(&self) -> Vec<String> {
        sorted_keys(&self.nodes)
    }

    pub fn scc_of(&self, key: &str) -> Option<&SCC> {
        self.node_to_scc.get(key).and_then(|id| self.sccs.get(id))
    }
}
