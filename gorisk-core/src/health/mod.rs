//! The dependency health scorer is an external collaborator (spec §1): a
//! remote metadata provider queried over HTTP. This module only defines the
//! interface the policy gate (§4.7) consumes, plus the bounded-parallel
//! fan-out contract (§5).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-package health signal as reported by the external health provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthReport {
    pub package: String,
    /// 0-100. `None` when the provider could not score the package (the
    /// gate treats this as "unknown", never as a failure trigger).
    pub score: Option<i64>,
    pub archived: bool,
    pub last_release_days_ago: Option<u32>,
}

impl HealthReport {
    pub fn unknown(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            score: None,
            archived: false,
            last_release_days_ago: None,
        }
    }
}

/// Aggregated timing for one health-scorer fan-out (spec §5: "per-worker
/// counters ... reduced into a single aggregated timing struct after
/// join").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthScanTiming {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub wall_time: Duration,
}

/// External collaborator interface for dependency health metadata.
///
/// Implementations are expected to be called from a bounded thread pool of
/// at most 10 concurrent workers (spec §5); this trait itself does not
/// prescribe concurrency, callers (`gorisk_analysis::policy::gate`) own the
/// fan-out.
pub trait HealthProvider: Send + Sync {
    fn fetch(&self, package: &str) -> HealthReport;
}

/// A provider that always reports "unknown" — used when no real health
/// backend is wired in, so the gate degrades gracefully rather than
/// panicking on a missing collaborator.
pub struct NullHealthProvider;

impl HealthProvider for NullHealthProvider {
    fn fetch(&self, package: &str) -> HealthReport {
        HealthReport::unknown(package)
    }
}
