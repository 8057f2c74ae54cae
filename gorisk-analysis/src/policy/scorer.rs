//! The composite risk scorer (spec §4.7): fuses direct and transitive
//! capability weight, CVE count, and taint findings into a single number,
//! then maps it onto a [`RiskLevel`] via frozen thresholds.

use gorisk_core::types::capability::{risk_weight, Capability, CapabilitySet, RiskLevel};
use gorisk_core::types::taint::TaintFinding;

use crate::fixpoint::decay;

/// `weight_cve` (spec §9 Open Question, frozen in this implementation).
pub const WEIGHT_CVE: f64 = 1.5;

/// `weight_taint[risk]` (spec §9 Open Question, frozen in this
/// implementation).
pub fn weight_taint(risk: RiskLevel) -> f64 {
    match risk {
        RiskLevel::High => 6.0,
        RiskLevel::Medium => 3.0,
        RiskLevel::Low => 1.0,
        RiskLevel::None => 0.0,
    }
}

/// Frozen composite thresholds (spec §9 Open Question): `< 3.0` -> none,
/// `< 8.0` -> low, `< 11.0` -> medium, else high. The high boundary sits
/// at 11.0 so a package with `{network, exec}` (direct 5.0) plus a single
/// HIGH taint finding (6.0) reaches `High` rather than settling in
/// `Medium`.
pub fn level_for_composite(composite: f64) -> RiskLevel {
    if composite < 3.0 {
        RiskLevel::None
    } else if composite < 8.0 {
        RiskLevel::Low
    } else if composite < 11.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// `Σ riskWeight(c) · confidence(c)` over the tags present in `set`.
fn weighted_confidence_sum(set: &CapabilitySet) -> f64 {
    set.list()
        .into_iter()
        .map(|c| risk_weight(c) as f64 * set.confidence(c))
        .sum()
}

/// The composite score for a single package (spec §4.7):
///
/// ```text
/// composite = Σ riskWeight(c)·confidence(c)                     [direct]
///           + Σ riskWeight(c)·confidence(c)·multiplier(depth)   [transitive]
///           + weight_cve · cveCount
///           + Σ weight_taint[risk]                              [per finding]
/// ```
///
/// `depth` for the transitive term is the package's converged propagation
/// depth (a single scalar per spec's `FunctionSummary.depth`), consistent
/// with how [`crate::fixpoint`] bounds depth at [`decay::MAX_DEPTH`].
pub fn composite_score(
    direct: &CapabilitySet,
    transitive: &CapabilitySet,
    transitive_depth: u32,
    cve_count: usize,
    findings: &[TaintFinding],
) -> f64 {
    let direct_term = weighted_confidence_sum(direct);
    let transitive_term = weighted_confidence_sum(transitive) * decay::multiplier(transitive_depth);
    let cve_term = WEIGHT_CVE * cve_count as f64;
    let taint_term: f64 = findings.iter().map(|f| weight_taint(f.risk)).sum();

    direct_term + transitive_term + cve_term + taint_term
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_zero_for_empty_inputs() {
        let empty = CapabilitySet::new();
        let score = composite_score(&empty, &empty, 0, 0, &[]);
        assert_eq!(score, 0.0);
        assert_eq!(level_for_composite(score), RiskLevel::None);
    }

    #[test]
    fn direct_exec_alone_lands_in_low_band() {
        let mut direct = CapabilitySet::new();
        direct.add(Capability::Exec); // weight 3, confidence 1.0 => 3.0
        let empty = CapabilitySet::new();
        let score = composite_score(&direct, &empty, 0, 0, &[]);
        assert!(score >= 3.0 && score < 8.0);
        assert_eq!(level_for_composite(score), RiskLevel::Low);
    }

    #[test]
    fn cve_count_pushes_composite_up() {
        let empty = CapabilitySet::new();
        let low = composite_score(&empty, &empty, 0, 0, &[]);
        let high = composite_score(&empty, &empty, 0, 5, &[]);
        assert!(high > low);
    }

    #[test]
    fn thresholds_are_monotone_bucket_boundaries() {
        assert_eq!(level_for_composite(2.999), RiskLevel::None);
        assert_eq!(level_for_composite(3.0), RiskLevel::Low);
        assert_eq!(level_for_composite(7.999), RiskLevel::Low);
        assert_eq!(level_for_composite(8.0), RiskLevel::Medium);
        assert_eq!(level_for_composite(10.999), RiskLevel::Medium);
        assert_eq!(level_for_composite(11.0), RiskLevel::High);
    }

    #[test]
    fn network_exec_with_one_high_taint_finding_reaches_high() {
        // Spec §8 scenario 5: {network, exec} direct (2.0 + 3.0 = 5.0) plus
        // one HIGH taint finding (6.0) must clear the high threshold.
        let mut direct = CapabilitySet::new();
        direct.add(Capability::Network);
        direct.add(Capability::Exec);
        let empty = CapabilitySet::new();
        let finding = gorisk_core::types::taint::TaintFinding {
            package: "evil-pkg".to_string(),
            module: "evil-pkg.run".to_string(),
            rule_id: "GORISK002".to_string(),
            source: Capability::Network,
            sink: Capability::Exec,
            risk: RiskLevel::High,
            note: "network flows into exec".to_string(),
            confidence: 1.0,
            evidence_chain: vec!["network -> exec".to_string()],
            source_func: "evil-pkg.run".to_string(),
            sink_func: "evil-pkg.run".to_string(),
            call_stack: vec![],
        };
        let score = composite_score(&direct, &empty, 0, 0, &[finding]);
        assert_eq!(score, 11.0);
        assert_eq!(level_for_composite(score), RiskLevel::High);
    }
}
