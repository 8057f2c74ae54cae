//! The intermediate representation fed into the analyzer (spec §3/§4.2):
//! `Symbol`, bounded calling `Context`, `CallEdge`, `FunctionCaps`, and the
//! merged `IRGraph`. Produced once by an external front end and never
//! mutated after construction — the analyzer only reads it.

use serde::{Deserialize, Serialize};

use crate::types::capability::CapabilitySet;
use crate::types::collections::FxHashMap;

/// `{package, name, kind}`, rendered `"<package>.<name>"` (or `".<name>"`
/// when `package` is empty, denoting the project-local module).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub package: String,
    pub name: String,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Func,
    Method,
    Var,
    Type,
}

impl Symbol {
    pub fn new(package: impl Into<String>, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn rendered(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered())
    }
}

/// A bounded calling context. `k=0` is the unit value; `k=1` carries the
/// single caller `Symbol`; `k>=2` is reserved and falls back to `k=1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Context {
    #[default]
    Unit,
    Caller(Symbol),
}

impl Context {
    pub fn rendered(&self) -> String {
        match self {
            Context::Unit => String::new(),
            Context::Caller(s) => s.rendered(),
        }
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered())
    }
}

/// `{function, context}` — the node identity in the call graph. Rendered
/// `"<function>@<context>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextNode {
    pub function: Symbol,
    pub context: Context,
}

impl ContextNode {
    pub fn new(function: Symbol, context: Context) -> Self {
        Self { function, context }
    }

    /// The map key used throughout `gorisk-analysis`: `"<function>@<context>"`.
    pub fn key(&self) -> String {
        format!("{}@{}", self.function.rendered(), self.context.rendered())
    }
}

impl std::fmt::Display for ContextNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// `{caller, callee, file, line, synthetic}`. `synthetic` marks edges
/// inferred without a syntactic call site (e.g. DI injection, dynamic
/// dispatch heuristics).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: Symbol,
    pub callee: Symbol,
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub synthetic: bool,
}

/// Per-function base record produced by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCaps {
    pub symbol: Symbol,
    pub direct_caps: CapabilitySet,
    #[serde(default)]
    pub transitive_caps: CapabilitySet,
    #[serde(default)]
    pub depth: u32,
}

impl FunctionCaps {
    pub fn new(symbol: Symbol, direct_caps: CapabilitySet) -> Self {
        Self {
            symbol,
            direct_caps,
            transitive_caps: CapabilitySet::new(),
            depth: 0,
        }
    }
}

/// The merged, language-agnostic IR fed into the analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IRGraph {
    /// Keyed by `Symbol::rendered()`.
    pub functions: FxHashMap<String, FunctionCaps>,
    pub calls: Vec<CallEdge>,
}

impl IRGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, symbol_key: &str) -> Option<&FunctionCaps> {
        self.functions.get(symbol_key)
    }
}

/// Merges per-package `{symbolKey -> FunctionCaps}` and
/// `{callerKey -> [CallEdge]}` maps into a flat [`IRGraph`]. Packages are
/// iterated in sorted order so the result is deterministic (spec §4.2).
pub fn consolidate(
    pkg_caps: &FxHashMap<String, FxHashMap<String, FunctionCaps>>,
    pkg_edges: &FxHashMap<String, Vec<CallEdge>>,
) -> IRGraph {
    let mut graph = IRGraph::new();

    let mut packages: Vec<&String> = pkg_caps.keys().collect();
    packages.sort();
    for pkg in packages {
        let funcs = &pkg_caps[pkg];
        let mut symbol_keys: Vec<&String> = funcs.keys().collect();
        symbol_keys.sort();
        for key in symbol_keys {
            graph.functions.insert(key.clone(), funcs[key].clone());
        }
    }

    let mut edge_packages: Vec<&String> = pkg_edges.keys().collect();
    edge_packages.sort();
    for pkg in edge_packages {
        let mut edges = pkg_edges[pkg].clone();
        edges.sort();
        graph.calls.extend(edges);
    }

    graph
}
