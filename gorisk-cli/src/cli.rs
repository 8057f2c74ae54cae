//! CLI argument parsing (spec §6): the `scan` command's flags and exit
//! codes.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "gorisk", about = "capability & taint analyzer for software dependencies")]
pub struct Cli {
    /// Project root to scan.
    pub project: PathBuf,

    /// Emit JSON instead of the default table.
    #[arg(long)]
    pub json: bool,

    /// Emit a SARIF 2.1.0 log instead of the default table.
    #[arg(long)]
    pub sarif: bool,

    /// Minimum risk level that causes a non-zero exit (overrides the
    /// policy file's `fail_on` when set).
    #[arg(long, value_enum)]
    pub fail_on: Option<FailOn>,

    /// Path to a policy JSON file.
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Front-end language to use.
    #[arg(long, value_enum, default_value_t = Lang::Auto)]
    pub lang: Lang,

    /// Print per-stage timings after the report.
    #[arg(long)]
    pub timings: bool,

    /// Verbose logging (equivalent to `GORISK_LOG=debug`).
    #[arg(long)]
    pub verbose: bool,

    /// Disable the on-disk function-summary cache.
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailOn {
    Low,
    Medium,
    High,
}

impl FailOn {
    pub fn as_str(self) -> &'static str {
        match self {
            FailOn::Low => "low",
            FailOn::Medium => "medium",
            FailOn::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Lang {
    Auto,
    Go,
    Node,
}

/// Process exit codes (spec §6): `0` pass, `1` policy failure, `2`
/// operational error.
pub mod exit_code {
    pub const PASS: i32 = 0;
    pub const POLICY_FAILURE: i32 = 1;
    pub const OPERATIONAL_ERROR: i32 = 2;
}
