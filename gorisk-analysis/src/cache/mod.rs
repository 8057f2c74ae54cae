//! The persistent function-summary cache (spec §4.8): content-addressed,
//! one JSON file per `(package, function, key hash)` entry. Reads verify
//! the stored key still matches; writes are best-effort and never fail the
//! analysis (spec §7).

pub mod key;

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use gorisk_core::diagnostics::{Diagnostic, DiagnosticSink};
use gorisk_core::errors::ExternalIoWarning;
use gorisk_core::types::ir::ContextNode;

use crate::callgraph::types::FunctionSummary;
pub use key::CacheKey;

/// Schema version stamped into every cache entry. Bumped whenever the
/// on-disk shape changes incompatibly; a mismatch is treated as a miss.
pub const CACHE_VERSION: u32 = 1;

/// Environment variable overriding the cache root (spec §6).
pub const CACHE_DIR_ENV_VAR: &str = "GORISK_CACHE_DIR";

/// A serializable projection of [`FunctionSummary`] — the parts that are
/// safe and meaningful to persist. `call_stack`/`iteration` are run-local
/// bookkeeping and are not cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedSummary {
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
    pub sanitizers: Vec<String>,
    pub effects: Vec<String>,
    pub transitive: Vec<String>,
    pub depth: u32,
    pub confidence: f64,
}

impl From<&FunctionSummary> for CachedSummary {
    fn from(s: &FunctionSummary) -> Self {
        let render = |caps: &gorisk_core::types::capability::CapabilitySet| {
            caps.list().into_iter().map(|c| c.as_str().to_string()).collect()
        };
        Self {
            sources: render(&s.sources),
            sinks: render(&s.sinks),
            sanitizers: render(&s.sanitizers),
            effects: render(&s.effects),
            transitive: render(&s.transitive),
            depth: s.depth,
            confidence: s.confidence,
        }
    }
}

/// Reconstructs a [`FunctionSummary`] skeleton from a cached projection
/// (the inverse of `From<&FunctionSummary> for CachedSummary`). Per-tag
/// evidence detail is not persisted, so every tag is re-added with a
/// single synthetic evidence record carrying the summary's own overall
/// confidence; `call_stack`/`iteration` are reset, matching `seed`'s
/// treatment of run-local bookkeeping.
pub fn cached_to_summary(node: ContextNode, cached: &CachedSummary) -> FunctionSummary {
    use gorisk_core::types::capability::{Capability, CapabilityEvidence, CapabilitySet};

    let build = |tags: &[String]| {
        let mut set = CapabilitySet::new();
        for t in tags {
            if let Some(cap) = Capability::parse(t) {
                set.add_with_evidence(cap, CapabilityEvidence::propagated(cached.confidence));
            }
        }
        set
    };

    FunctionSummary {
        node,
        sources: build(&cached.sources),
        sinks: build(&cached.sinks),
        sanitizers: build(&cached.sanitizers),
        effects: build(&cached.effects),
        transitive: build(&cached.transitive),
        depth: cached.depth,
        confidence: cached.confidence,
        call_stack: Vec::new(),
        iteration: 0,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    key: CacheKey,
    summary: CachedSummary,
    timestamp: u64,
    version: u32,
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
}

/// The on-disk summary cache. Cheap to construct; all mutable state is the
/// hit/miss counter pair, mutex-guarded per spec §5.
pub struct SummaryCache {
    root: PathBuf,
    counters: Mutex<Counters>,
}

impl SummaryCache {
    /// Resolves the cache root: `GORISK_CACHE_DIR` if set, else
    /// `$HOME/.cache/gorisk/summaries` (spec §4.8).
    pub fn default_root() -> PathBuf {
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV_VAR) {
            return PathBuf::from(dir);
        }
        dirs_home().join(".cache").join("gorisk").join("summaries")
    }

    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            counters: Mutex::new(Counters::default()),
        }
    }

    fn entry_path(&self, package: &str, function_name: &str, key_hash: &str) -> PathBuf {
        self.root.join(package).join(format!("{function_name}_{key_hash}.json"))
    }

    /// Looks up `key` for `package`/`function_name`. A miss is recorded for
    /// any I/O error, deserialization failure, version mismatch, or
    /// rematerialized-key mismatch — none of these are fatal.
    pub fn get(
        &self,
        package: &str,
        function_name: &str,
        key: &CacheKey,
        diagnostics: &DiagnosticSink,
    ) -> Option<CachedSummary> {
        let path = self.entry_path(package, function_name, &key.digest());
        let result = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str::<CacheEntry>(&text).ok())
            .filter(|entry| entry.version == CACHE_VERSION && &entry.key == key)
            .map(|entry| entry.summary);

        let mut counters = self.counters.lock().expect("cache counters poisoned");
        match &result {
            Some(_) => counters.hits += 1,
            None => {
                counters.misses += 1;
                if path.exists() {
                    diagnostics.push(Diagnostic::ExternalIo(ExternalIoWarning::CacheReadFailed {
                        key: key.digest(),
                        message: format!("{} did not contain a valid, matching entry", path.display()),
                    }));
                }
            }
        }
        result
    }

    /// Best-effort write; any failure is logged and swallowed (spec §4.8:
    /// "failure to write must not fail the analysis").
    pub fn put(
        &self,
        package: &str,
        function_name: &str,
        key: &CacheKey,
        summary: &CachedSummary,
        timestamp: u64,
        diagnostics: &DiagnosticSink,
    ) {
        let path = self.entry_path(package, function_name, &key.digest());
        let entry = CacheEntry {
            key: key.clone(),
            summary: summary.clone(),
            timestamp,
            version: CACHE_VERSION,
        };

        let write_result = (|| -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string(&entry)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            fs::write(&path, json)
        })();

        if let Err(e) = write_result {
            diagnostics.push(Diagnostic::ExternalIo(ExternalIoWarning::CacheWriteFailed {
                key: key.digest(),
                message: e.to_string(),
            }));
        }
    }

    /// `(hits, misses)` for this run.
    pub fn stats(&self) -> (u64, u64) {
        let counters = self.counters.lock().expect("cache counters poisoned");
        (counters.hits, counters.misses)
    }
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}
