//! The policy gate (spec §4.7): turns per-package composite scores, deny
//! rules, and health signals into a single pass/fail verdict, applying
//! allow-list exceptions along the way.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use gorisk_core::config::policy::{AllowException, PolicyFile};
use gorisk_core::diagnostics::{Diagnostic, DiagnosticSink};
use gorisk_core::health::{HealthProvider, HealthReport};
use gorisk_core::types::capability::{Capability, CapabilitySet, RiskLevel};
use gorisk_core::types::taint::TaintFinding;
use gorisk_core::vuln::VulnProvider;

use super::scorer::{composite_score, level_for_composite};

/// Per-package analyzer output fed into the gate. Built by the pipeline
/// from the converged call graph; the gate itself never touches the graph.
#[derive(Debug, Clone)]
pub struct PackageInput {
    pub package: String,
    pub direct: CapabilitySet,
    pub transitive: CapabilitySet,
    pub transitive_depth: u32,
    pub taint_findings: Vec<TaintFinding>,
}

#[derive(Debug, Clone)]
pub struct PackageScore {
    pub package: String,
    pub composite: f64,
    pub level: RiskLevel,
    pub capabilities: CapabilitySet,
    pub taint_findings: Vec<TaintFinding>,
    pub health: HealthReport,
    pub cve_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GateVerdict {
    pub passed: bool,
    pub reason: Option<String>,
    pub package_scores: Vec<PackageScore>,
    pub expired_exceptions: usize,
}

fn parse_taint_key(s: &str) -> Option<(Capability, Capability)> {
    let (src, sink) = if let Some(split) = s.split_once('\u{2192}') {
        split
    } else {
        s.split_once("->")?
    };
    Some((Capability::parse(src.trim())?, Capability::parse(sink.trim())?))
}

fn exception_for<'a>(exceptions: &'a [AllowException], package: &str) -> Option<&'a AllowException> {
    exceptions.iter().find(|e| e.package == package)
}

/// Runs the policy gate over every non-excluded package.
///
/// The health-provider fan-out runs on a dedicated `rayon` pool sized
/// `min(10, packages.len())` (spec §5); each worker calls
/// [`HealthProvider::fetch`] independently with no shared mutable state.
pub fn run_gate(
    policy: &PolicyFile,
    packages: Vec<PackageInput>,
    health: &dyn HealthProvider,
    vuln: &dyn VulnProvider,
    diagnostics: &DiagnosticSink,
    today: &str,
) -> GateVerdict {
    let deny_caps: Vec<Capability> = policy
        .deny_capabilities
        .iter()
        .filter_map(|s| Capability::parse(s))
        .collect();

    let candidates: Vec<PackageInput> = packages
        .into_iter()
        .filter(|p| !policy.exclude_packages.contains(&p.package))
        .collect();

    let pool_size = std::cmp::min(10, std::cmp::max(1, candidates.len()));
    let pool = ThreadPoolBuilder::new()
        .num_threads(pool_size)
        .build()
        .expect("failed to build health-scorer thread pool");

    let (health_reports, vuln_reports): (Vec<HealthReport>, Vec<_>) = pool.install(|| {
        let health_reports: Vec<HealthReport> = candidates.par_iter().map(|p| health.fetch(&p.package)).collect();
        let vuln_reports: Vec<_> = candidates.par_iter().map(|p| vuln.fetch(&p.package)).collect();
        (health_reports, vuln_reports)
    });

    let mut expired_exceptions = 0usize;
    let mut package_scores = Vec::with_capacity(candidates.len());
    let mut failure_reason: Option<String> = None;

    for (idx, input) in candidates.into_iter().enumerate() {
        let exception = exception_for(&policy.allow_exceptions, &input.package);
        let active_exception = match exception {
            Some(exc) if exc.is_expired(today) => {
                expired_exceptions += 1;
                diagnostics.push(Diagnostic::PolicyExceptionExpired {
                    package: input.package.clone(),
                    expired_on: exc.expires.clone(),
                });
                None
            }
            Some(exc) => Some(exc),
            None => None,
        };

        let suppressed: Vec<Capability> = active_exception
            .map(|e| e.capabilities.iter().filter_map(|s| Capability::parse(s)).collect())
            .unwrap_or_default();

        let exempt_taint: Vec<(Capability, Capability)> = active_exception
            .map(|e| e.taint.iter().filter_map(|s| parse_taint_key(s)).collect())
            .unwrap_or_default();

        let findings: Vec<TaintFinding> = input
            .taint_findings
            .into_iter()
            .filter(|f| !exempt_taint.contains(&(f.source, f.sink)))
            .collect();

        let health_report = health_reports[idx].clone();
        let cve_ids = vuln_reports[idx].cve_ids.clone();

        let composite = composite_score(
            &input.direct,
            &input.transitive,
            input.transitive_depth,
            cve_ids.len(),
            &findings,
        );
        let level = level_for_composite(composite);

        if failure_reason.is_none() {
            let denied_hit = deny_caps
                .iter()
                .find(|c| (input.direct.has(**c) || input.transitive.has(**c)) && !suppressed.contains(c));
            if let Some(cap) = denied_hit {
                failure_reason = Some(format!("{} carries denied capability {}", input.package, cap));
            } else if level.value() >= policy.fail_on_value() {
                failure_reason = Some(format!(
                    "{} composite risk {} ({:.2}) meets or exceeds fail-on threshold",
                    input.package, level, composite
                ));
            } else if policy.block_archived && health_report.archived {
                failure_reason = Some(format!("{} is archived and block_archived is set", input.package));
            } else if let (Some(min), Some(score)) = (policy.min_health_score, health_report.score) {
                if score < min {
                    failure_reason = Some(format!(
                        "{} health score {} is below min_health_score {}",
                        input.package, score, min
                    ));
                }
            }
        }

        let mut capabilities = input.direct.clone();
        capabilities.merge(&input.transitive);
        package_scores.push(PackageScore {
            package: input.package,
            composite,
            level,
            capabilities,
            taint_findings: findings,
            health: health_report,
            cve_ids,
        });
    }

    GateVerdict {
        passed: failure_reason.is_none(),
        reason: failure_reason,
        package_scores,
        expired_exceptions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorisk_core::health::NullHealthProvider;
    use gorisk_core::vuln::NullVulnProvider;

    fn policy(fail_on: &str) -> PolicyFile {
        PolicyFile {
            version: 1,
            fail_on: fail_on.to_string(),
            max_health_score: None,
            min_health_score: None,
            block_archived: false,
            deny_capabilities: vec![],
            allow_exceptions: vec![],
            max_dep_depth: None,
            exclude_packages: vec![],
        }
    }

    fn input(package: &str, caps: &[Capability]) -> PackageInput {
        let mut set = CapabilitySet::new();
        for c in caps {
            set.add(*c);
        }
        PackageInput {
            package: package.to_string(),
            direct: set,
            transitive: CapabilitySet::new(),
            transitive_depth: 0,
            taint_findings: vec![],
        }
    }

    #[test]
    fn passes_when_nothing_crosses_fail_on() {
        let verdict = run_gate(
            &policy("high"),
            vec![input("left-pad", &[Capability::Crypto])],
            &NullHealthProvider,
            &NullVulnProvider,
            &DiagnosticSink::new(),
            "2026-07-28",
        );
        assert!(verdict.passed);
    }

    #[test]
    fn fails_when_composite_meets_fail_on() {
        let verdict = run_gate(
            &policy("low"),
            vec![input("evil-pkg", &[Capability::Exec])],
            &NullHealthProvider,
            &NullVulnProvider,
            &DiagnosticSink::new(),
            "2026-07-28",
        );
        assert!(!verdict.passed);
        assert!(verdict.reason.unwrap().contains("evil-pkg"));
    }

    #[test]
    fn deny_capabilities_fail_without_exception() {
        let mut p = policy("high");
        p.deny_capabilities = vec!["exec".to_string()];
        let verdict = run_gate(
            &p,
            vec![input("evil-pkg", &[Capability::Exec])],
            &NullHealthProvider,
            &NullVulnProvider,
            &DiagnosticSink::new(),
            "2026-07-28",
        );
        assert!(!verdict.passed);
    }

    #[test]
    fn non_expired_exception_suppresses_denied_capability() {
        let mut p = policy("high");
        p.deny_capabilities = vec!["exec".to_string()];
        p.allow_exceptions = vec![AllowException {
            package: "evil-pkg".to_string(),
            capabilities: vec!["exec".to_string()],
            taint: vec![],
            expires: "2099-01-01".to_string(),
        }];
        let verdict = run_gate(
            &p,
            vec![input("evil-pkg", &[Capability::Exec])],
            &NullHealthProvider,
            &NullVulnProvider,
            &DiagnosticSink::new(),
            "2026-07-28",
        );
        assert!(verdict.passed);
    }

    #[test]
    fn expired_exception_is_not_applied_and_is_counted() {
        let mut p = policy("high");
        p.deny_capabilities = vec!["exec".to_string()];
        p.allow_exceptions = vec![AllowException {
            package: "evil-pkg".to_string(),
            capabilities: vec!["exec".to_string()],
            taint: vec![],
            expires: "2000-01-01".to_string(),
        }];
        let diagnostics = DiagnosticSink::new();
        let verdict = run_gate(
            &p,
            vec![input("evil-pkg", &[Capability::Exec])],
            &NullHealthProvider,
            &NullVulnProvider,
            &diagnostics,
            "2026-07-28",
        );
        assert!(!verdict.passed);
        assert_eq!(verdict.expired_exceptions, 1);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn excluded_packages_are_skipped_entirely() {
        let mut p = policy("low");
        p.exclude_packages = vec!["evil-pkg".to_string()];
        let verdict = run_gate(
            &p,
            vec![input("evil-pkg", &[Capability::Exec])],
            &NullHealthProvider,
            &NullVulnProvider,
            &DiagnosticSink::new(),
            "2026-07-28",
        );
        assert!(verdict.passed);
        assert!(verdict.package_scores.is_empty());
    }
}
