//! `TaintFinding` (spec §3): a concrete source->sink co-occurrence in a
//! package, with the call path that links them. Lives in `gorisk-core`
//! (rather than `gorisk-analysis`, where the tracer that produces it does)
//! because report formatters at the CLI boundary need the shape without
//! depending on the whole analysis engine.

use serde::{Deserialize, Serialize};

use crate::types::capability::{Capability, RiskLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaintFinding {
    pub package: String,
    pub module: String,
    /// Stable SARIF rule id for the rule that fired, e.g. `"GORISK001"`.
    pub rule_id: String,
    pub source: Capability,
    pub sink: Capability,
    pub risk: RiskLevel,
    pub note: String,
    pub confidence: f64,
    pub evidence_chain: Vec<String>,
    pub source_func: String,
    pub sink_func: String,
    pub call_stack: Vec<String>,
}

impl TaintFinding {
    /// `(package, source, sink)` — the deduplication key (spec §4.6).
    pub fn dedup_key(&self) -> (String, Capability, Capability) {
        (self.package.clone(), self.source, self.sink)
    }

    /// Sort order: HIGH before MEDIUM before LOW; within a tier, package
    /// ascending, then source tag (spec §4.6).
    pub fn sort_key(&self) -> (std::cmp::Reverse<u8>, String, Capability) {
        (std::cmp::Reverse(self.risk.value()), self.package.clone(), self.source)
    }
}
