//! The capability lattice (spec §3/§4.1): a closed set of dangerous-action
//! tags, their source/sink/sanitizer roles, risk weights, and the
//! evidence-carrying set algebra built on top of them.
//!
//! String forms (`"exec"`, `"fs:read"`, ...) exist only at this
//! (de)serialization boundary (spec §9's redesign flag against
//! stringly-typed polymorphism) — everywhere else in the workspace
//! `Capability` is this closed enum.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::types::collections::FxHashMap;

/// A dangerous capability a package can exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Exec,
    Network,
    #[serde(rename = "fs:read")]
    FsRead,
    #[serde(rename = "fs:write")]
    FsWrite,
    Env,
    Unsafe,
    Reflect,
    Crypto,
    Plugin,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::Exec,
        Capability::Network,
        Capability::FsRead,
        Capability::FsWrite,
        Capability::Env,
        Capability::Unsafe,
        Capability::Reflect,
        Capability::Crypto,
        Capability::Plugin,
    ];

    /// The wire string for this tag — the only place a `Capability` is
    /// rendered/parsed as a string outside of `serde`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Exec => "exec",
            Capability::Network => "network",
            Capability::FsRead => "fs:read",
            Capability::FsWrite => "fs:write",
            Capability::Env => "env",
            Capability::Unsafe => "unsafe",
            Capability::Reflect => "reflect",
            Capability::Crypto => "crypto",
            Capability::Plugin => "plugin",
        }
    }

    pub fn parse(s: &str) -> Option<Capability> {
        Capability::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a capability plays in taint analysis. `network` can be both a
/// source (ingress, e.g. reading a request body) and a sink (exfil, e.g.
/// an outbound call) depending on flow direction — [`classify`] returns its
/// *default* role (source); the taint rule table in
/// `gorisk_analysis::taint::rules` is what actually distinguishes the two
/// directions per-rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Sink,
    Sanitizer,
    None,
}

pub fn classify(c: Capability) -> Role {
    match c {
        Capability::Env | Capability::Network | Capability::FsRead => Role::Source,
        Capability::Exec | Capability::FsWrite | Capability::Unsafe => Role::Sink,
        Capability::Crypto => Role::Sanitizer,
        Capability::Reflect | Capability::Plugin => Role::None,
    }
}

/// Static severity weight, 0 (none) to 3 (high).
pub fn risk_weight(c: Capability) -> u8 {
    match c {
        Capability::Exec | Capability::Unsafe => 3,
        Capability::FsWrite | Capability::Network => 2,
        Capability::Env | Capability::FsRead | Capability::Reflect | Capability::Plugin => 1,
        Capability::Crypto => 0,
    }
}

/// A composite risk level, used both for a single [`CapabilitySet`] and for
/// the policy gate's overall composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `none=0, low=1, medium=2, high=3` (spec §4.1 `RiskValue`).
    pub fn value(self) -> u8 {
        match self {
            RiskLevel::None => 0,
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
        }
    }

    pub fn from_value(v: u8) -> RiskLevel {
        match v {
            0 => RiskLevel::None,
            1 => RiskLevel::Low,
            2 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    /// One level down; `Low` stays `Low` (spec §4.6 downgrade rule reused
    /// here for the gate's FP-style downgrades).
    pub fn downgrade(self) -> RiskLevel {
        match self {
            RiskLevel::High => RiskLevel::Medium,
            RiskLevel::Medium => RiskLevel::Low,
            RiskLevel::Low | RiskLevel::None => RiskLevel::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a capability attribution was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Via {
    Import,
    CallSite,
    Script,
    Propagated,
}

/// `{file, line, context, via, confidence}` — metadata recording where and
/// how a capability tag was attributed (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEvidence {
    pub file: String,
    pub line: u32,
    pub context: String,
    pub via: Via,
    pub confidence: f64,
}

impl CapabilityEvidence {
    pub fn new(file: impl Into<String>, line: u32, context: impl Into<String>, via: Via, confidence: f64) -> Self {
        Self {
            file: file.into(),
            line,
            context: context.into(),
            via,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn propagated(confidence: f64) -> Self {
        Self {
            file: String::new(),
            line: 0,
            context: String::new(),
            via: Via::Propagated,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

type EvidenceList = SmallVec<[CapabilityEvidence; 2]>;

/// A mapping from [`Capability`] to a non-empty list of
/// [`CapabilityEvidence`] (spec §3). Absence from the map means the
/// capability is not present; evidence lists are append-only during a
/// build phase and deduplicated on merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySet {
    evidence: FxHashMap<Capability, EvidenceList>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, c: Capability) {
        self.add_with_evidence(c, CapabilityEvidence::propagated(1.0));
    }

    pub fn add_with_evidence(&mut self, c: Capability, ev: CapabilityEvidence) {
        self.evidence.entry(c).or_default().push(ev);
    }

    pub fn has(&self, c: Capability) -> bool {
        self.evidence.contains_key(&c)
    }

    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }

    /// Tags present, in stable (sorted) order. Sorted by wire string
    /// (`as_str()`), not by enum declaration order, since `Capability`'s
    /// derived `Ord` is declaration order and would not be lexicographic.
    pub fn list(&self) -> Vec<Capability> {
        let mut tags: Vec<Capability> = self.evidence.keys().copied().collect();
        tags.sort_by_key(|c| c.as_str());
        tags
    }

    pub fn evidence_for(&self, c: Capability) -> &[CapabilityEvidence] {
        self.evidence.get(&c).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Max confidence across a capability's evidence list, or 0 if absent.
    pub fn confidence(&self, c: Capability) -> f64 {
        self.evidence
            .get(&c)
            .and_then(|evs| evs.iter().map(|e| e.confidence).max_by(f64::total_cmp))
            .unwrap_or(0.0)
    }

    /// `Σ riskWeight(c)` over present tags.
    pub fn score(&self) -> u32 {
        self.list().iter().map(|c| risk_weight(*c) as u32).sum()
    }

    /// `max riskWeight` present, mapped to a level.
    pub fn risk_level(&self) -> RiskLevel {
        let max_weight = self.list().iter().map(|c| risk_weight(*c)).max().unwrap_or(0);
        RiskLevel::from_value(max_weight)
    }

    /// Union of keys, concatenated-then-deduplicated evidence lists.
    /// Idempotent, commutative, associative.
    pub fn merge_with_evidence(&mut self, other: &CapabilitySet) {
        for (cap, evs) in other.evidence.iter() {
            let entry = self.evidence.entry(*cap).or_default();
            for ev in evs {
                if !entry.contains(ev) {
                    entry.push(ev.clone());
                }
            }
        }
    }

    /// Join that keeps only tag presence (adds one propagated-evidence
    /// record per newly-introduced tag), matching spec's plain `merge`.
    pub fn merge(&mut self, other: &CapabilitySet) {
        self.merge_with_evidence(other);
    }

    /// Sorted, comma-joined display form, e.g. `"env, exec, network"`.
    pub fn string(&self) -> String {
        self.list()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, &[CapabilityEvidence])> {
        self.list().into_iter().map(move |c| (c, self.evidence_for(c)))
    }
}

impl Ord for CapabilityEvidence {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.file.as_str(), self.line, self.context.as_str())
            .cmp(&(other.file.as_str(), other.line, other.context.as_str()))
    }
}
impl PartialOrd for CapabilityEvidence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Eq for CapabilityEvidence {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_total_over_known_roles() {
        assert_eq!(classify(Capability::Env), Role::Source);
        assert_eq!(classify(Capability::Network), Role::Source);
        assert_eq!(classify(Capability::FsRead), Role::Source);
        assert_eq!(classify(Capability::Exec), Role::Sink);
        assert_eq!(classify(Capability::FsWrite), Role::Sink);
        assert_eq!(classify(Capability::Unsafe), Role::Sink);
        assert_eq!(classify(Capability::Crypto), Role::Sanitizer);
    }

    #[test]
    fn merge_is_idempotent_commutative_associative() {
        let mut a = CapabilitySet::new();
        a.add(Capability::Exec);
        let mut b = CapabilitySet::new();
        b.add(Capability::Network);
        let mut c = CapabilitySet::new();
        c.add(Capability::Env);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ab_c = ab.clone();
        ab_c.merge(&c);

        let mut bc = b.clone();
        bc.merge(&c);
        let mut a_bc = a.clone();
        a_bc.merge(&bc);

        assert_eq!(ab_c.list(), a_bc.list());

        let mut idempotent = ab.clone();
        idempotent.merge(&ab);
        assert_eq!(idempotent.list(), ab.list());
    }

    #[test]
    fn adding_evidence_never_removes_a_tag() {
        let mut set = CapabilitySet::new();
        set.add(Capability::Exec);
        assert!(set.has(Capability::Exec));
        set.add_with_evidence(
            Capability::Exec,
            CapabilityEvidence::new("a.go", 10, "", Via::CallSite, 0.5),
        );
        assert!(set.has(Capability::Exec));
        assert_eq!(set.evidence_for(Capability::Exec).len(), 2);
    }

    #[test]
    fn score_and_risk_level_track_max_weight() {
        let mut set = CapabilitySet::new();
        set.add(Capability::Env); // weight 1
        set.add(Capability::Exec); // weight 3
        assert_eq!(set.score(), 4);
        assert_eq!(set.risk_level(), RiskLevel::High);
    }

    #[test]
    fn confidence_is_max_across_evidence() {
        let mut set = CapabilitySet::new();
        set.add_with_evidence(Capability::Exec, CapabilityEvidence::propagated(0.3));
        set.add_with_evidence(Capability::Exec, CapabilityEvidence::propagated(0.8));
        assert_eq!(set.confidence(Capability::Exec), 0.8);
        assert_eq!(set.confidence(Capability::Network), 0.0);
    }
}
