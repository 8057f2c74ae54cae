//! Process-wide diagnostic plumbing.
//!
//! The teacher crate threads a global `tracing` subscriber through its
//! workspace and keeps a narrowly-scoped "verbose" flag rather than a
//! singleton logger object; gorisk follows the same shape, plus an explicit
//! [`DiagnosticSink`] so non-fatal warnings (transient I/O, fixpoint
//! over-limit, expired policy exceptions) can be asserted on in tests
//! without scraping log output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::errors::ExternalIoWarning;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Environment variable that enables verbose logging (spec §6).
pub const VERBOSE_ENV_VAR: &str = "GORISK_LOG";

/// Initialize the global `tracing` subscriber once per process. Safe to
/// call more than once; subsequent calls are no-ops.
pub fn init_tracing() {
    let verbose = std::env::var(VERBOSE_ENV_VAR)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("debug") || v.eq_ignore_ascii_case("trace"))
        .unwrap_or(false);
    VERBOSE.store(verbose, Ordering::Relaxed);

    let filter = if verbose {
        "gorisk=debug,info"
    } else {
        "gorisk=info,warn"
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}

pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// A non-fatal condition surfaced during a scan. All of these are logged at
/// `warn` level when they occur and never cause the scan to fail (spec §7).
#[derive(Debug, Clone)]
pub enum Diagnostic {
    ExternalIo(ExternalIoWarning),
    FixpointBudgetExhausted { iterations: u32, pending: usize },
    PolicyExceptionExpired { package: String, expired_on: String },
    /// Summary-cache hit/miss totals for one run, emitted whenever
    /// `hits + misses > 0` (spec §4.8: "Hit/miss counters are tracked per
    /// run and emitted to the diagnostic stream when a total > 0").
    CacheStats { hits: u64, misses: u64 },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExternalIo(w) => write!(f, "{w}"),
            Self::FixpointBudgetExhausted { iterations, pending } => write!(
                f,
                "fixpoint did not converge after {iterations} iterations ({pending} nodes still pending); proceeding with partial summaries"
            ),
            Self::PolicyExceptionExpired { package, expired_on } => write!(
                f,
                "policy exception for {package} expired on {expired_on}; not applied"
            ),
            Self::CacheStats { hits, misses } => write!(f, "summary cache: {hits} hit(s), {misses} miss(es)"),
        }
    }
}

/// Accumulates [`Diagnostic`]s for a single run. Cheap to clone/share: the
/// inner buffer is mutex-guarded since the health scorer's worker pool may
/// push to it concurrently (spec §5: "cache's in-memory hit/miss counters
/// are guarded by a mutex" — the same treatment applies here).
#[derive(Default)]
pub struct DiagnosticSink {
    buffer: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.buffer.lock().expect("diagnostic sink poisoned").push(diagnostic);
    }

    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.buffer.lock().expect("diagnostic sink poisoned"))
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().expect("diagnostic sink poisoned").is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().expect("diagnostic sink poisoned").len()
    }
}
