//! Report rendering (spec §6): pretty table (default), JSON, or
//! SARIF 2.1.0. JSON/SARIF schemas are built from plain `serde`-derived
//! structs so their shape is stable across runs given the same input.

use serde::Serialize;

use gorisk_analysis::pipeline::ScanReport;

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub passed: bool,
    pub reason: Option<String>,
    pub expired_exceptions: usize,
    pub packages: Vec<JsonPackage>,
}

#[derive(Debug, Serialize)]
pub struct JsonPackage {
    pub package: String,
    pub composite: f64,
    pub level: String,
    pub capabilities: Vec<String>,
    pub cve_ids: Vec<String>,
    pub taint_findings: Vec<JsonFinding>,
}

#[derive(Debug, Serialize)]
pub struct JsonFinding {
    pub rule_id: String,
    pub source: String,
    pub sink: String,
    pub risk: String,
    pub confidence: f64,
    pub call_stack: Vec<String>,
}

pub fn to_json_report(report: &ScanReport) -> JsonReport {
    JsonReport {
        passed: report.verdict.passed,
        reason: report.verdict.reason.clone(),
        expired_exceptions: report.verdict.expired_exceptions,
        packages: report
            .verdict
            .package_scores
            .iter()
            .map(|p| JsonPackage {
                package: p.package.clone(),
                composite: p.composite,
                level: p.level.as_str().to_string(),
                capabilities: p.capabilities.list().into_iter().map(|c| c.as_str().to_string()).collect(),
                cve_ids: p.cve_ids.clone(),
                taint_findings: p
                    .taint_findings
                    .iter()
                    .map(|f| JsonFinding {
                        rule_id: f.rule_id.clone(),
                        source: f.source.as_str().to_string(),
                        sink: f.sink.as_str().to_string(),
                        risk: f.risk.as_str().to_string(),
                        confidence: f.confidence,
                        call_stack: f.call_stack.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn render_json(report: &ScanReport) -> String {
    serde_json::to_string_pretty(&to_json_report(report)).expect("JsonReport always serializes")
}

#[derive(Debug, Serialize)]
struct SarifLog {
    version: &'static str,
    #[serde(rename = "$schema")]
    schema: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: &'static str,
    #[serde(rename = "informationUri")]
    information_uri: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "logicalLocations")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
}

fn sarif_level(risk: &str) -> &'static str {
    match risk {
        "high" => "error",
        "medium" => "warning",
        _ => "note",
    }
}

/// Renders findings (already sorted/deduped by the tracer) as a SARIF
/// 2.1.0 log with one result per `(package, source, sink)` finding.
pub fn render_sarif(report: &ScanReport) -> String {
    let mut results = Vec::new();
    for pkg in &report.verdict.package_scores {
        for finding in &pkg.taint_findings {
            results.push(SarifResult {
                rule_id: finding.rule_id.clone(),
                level: sarif_level(finding.risk.as_str()),
                message: SarifMessage {
                    text: finding.note.clone(),
                },
                locations: vec![SarifLocation {
                    logical_locations: vec![SarifLogicalLocation {
                        fully_qualified_name: format!("{}::{}", pkg.package, finding.source_func),
                    }],
                }],
            });
        }
    }

    let log = SarifLog {
        version: "2.1.0",
        schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "gorisk",
                    information_uri: "https://github.com/gorisk/gorisk",
                    version: env!("CARGO_PKG_VERSION"),
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&log).expect("SarifLog always serializes")
}

/// A plain-text table, the default output format (spec §6).
pub fn render_table(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str("PACKAGE              LEVEL    SCORE   CAPABILITIES\n");
    for pkg in &report.verdict.package_scores {
        let caps = pkg.capabilities.string();
        out.push_str(&format!(
            "{:<20} {:<8} {:>6.2}  {}\n",
            pkg.package,
            pkg.level.as_str(),
            pkg.composite,
            if caps.is_empty() { "-".to_string() } else { caps }
        ));
    }
    out.push('\n');
    match &report.verdict.reason {
        Some(reason) => out.push_str(&format!("FAIL: {reason}\n")),
        None => out.push_str("PASS\n"),
    }
    if report.verdict.expired_exceptions > 0 {
        out.push_str(&format!(
            "{} allow-list exception(s) expired and were not applied\n",
            report.verdict.expired_exceptions
        ));
    }
    out
}
