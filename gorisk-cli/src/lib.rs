//! The `gorisk` CLI (spec §6): argument parsing, wiring a [`FrontEnd`]
//! implementation and health/vuln providers into the analysis pipeline,
//! and rendering the three report formats.

pub mod cli;
pub mod fixture_frontend;
pub mod report;

use std::path::Path;
use std::sync::Arc;

use gorisk_core::config::policy::PolicyFile;
use gorisk_core::diagnostics::DiagnosticSink;
use gorisk_core::errors::{ConfigError, FrontEndError};
use gorisk_core::frontend::FrontEnd;
use gorisk_core::health::NullHealthProvider;
use gorisk_core::vuln::NullVulnProvider;
use gorisk_analysis::cache::SummaryCache;
use gorisk_analysis::pipeline::{run_pipeline_from_raw_ir, PipelineConfig, ScanReport};

use cli::{Cli, FailOn};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    FrontEnd(#[from] FrontEndError),
}

fn load_policy(policy_path: Option<&Path>, fail_on_override: Option<FailOn>) -> Result<PolicyFile, ConfigError> {
    let mut policy = match policy_path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|_| ConfigError::PolicyNotFound {
                path: path.display().to_string(),
            })?;
            PolicyFile::from_json(&text)?
        }
        None => PolicyFile {
            version: 1,
            fail_on: "high".to_string(),
            max_health_score: None,
            min_health_score: None,
            block_archived: false,
            deny_capabilities: Vec::new(),
            allow_exceptions: Vec::new(),
            max_dep_depth: None,
            exclude_packages: Vec::new(),
        },
    };
    if let Some(fail_on) = fail_on_override {
        policy.fail_on = fail_on.as_str().to_string();
    }
    policy.validate()?;
    Ok(policy)
}

/// Runs a scan for `cli` against `today` (an ISO-8601 date used for policy
/// exception expiry), returning the finished report and the diagnostics
/// accumulated along the way.
pub fn run_scan(cli: &Cli, today: &str) -> Result<(ScanReport, DiagnosticSink), CliError> {
    let policy = load_policy(cli.policy.as_deref(), cli.fail_on)?;

    let front_end = fixture_frontend::JsonFixtureFrontEnd;
    let raw_ir = front_end.build(&cli.project)?;

    let cache = if cli.no_cache {
        None
    } else {
        Some(Arc::new(SummaryCache::new(SummaryCache::default_root())))
    };
    let config = PipelineConfig { cache, ..PipelineConfig::default() };

    let diagnostics = DiagnosticSink::new();
    let (report, _) = run_pipeline_from_raw_ir(&raw_ir, &policy, &NullHealthProvider, &NullVulnProvider, &config, &diagnostics, today);
    Ok((report, diagnostics))
}
