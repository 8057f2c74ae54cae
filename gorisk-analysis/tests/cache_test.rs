//! Summary cache round-trip scenarios, exercised through the public
//! `gorisk_analysis` API (the corrupt-file-is-a-miss case needs a private
//! path helper and stays as a unit test in `cache/mod.rs`).

use gorisk_core::diagnostics::DiagnosticSink;
use gorisk_core::types::ir::{Context, Symbol, SymbolKind};

use gorisk_analysis::cache::{CacheKey, CachedSummary, SummaryCache};

fn key() -> CacheKey {
    CacheKey {
        function: Symbol::new("p", "f", SymbolKind::Func),
        context: Context::Unit,
        direct_caps_hash: "abc".into(),
        callee_hashes: vec![],
        code_hash: "xyz".into(),
    }
}

fn summary() -> CachedSummary {
    CachedSummary {
        sources: vec!["env".into()],
        sinks: vec!["exec".into()],
        sanitizers: vec![],
        effects: vec!["env".into(), "exec".into()],
        transitive: vec![],
        depth: 0,
        confidence: 1.0,
    }
}

#[test]
fn miss_on_empty_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SummaryCache::new(dir.path().to_path_buf());
    let diagnostics = DiagnosticSink::new();
    assert!(cache.get("p", "f", &key(), &diagnostics).is_none());
    assert_eq!(cache.stats(), (0, 1));
}

#[test]
fn round_trips_a_written_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SummaryCache::new(dir.path().to_path_buf());
    let diagnostics = DiagnosticSink::new();
    cache.put("p", "f", &key(), &summary(), 0, &diagnostics);
    let found = cache.get("p", "f", &key(), &diagnostics).unwrap();
    assert_eq!(found, summary());
    assert_eq!(cache.stats(), (1, 0));
}

#[test]
fn mismatched_key_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SummaryCache::new(dir.path().to_path_buf());
    let diagnostics = DiagnosticSink::new();
    cache.put("p", "f", &key(), &summary(), 0, &diagnostics);

    let mut other_key = key();
    other_key.code_hash = "different".into();
    assert!(cache.get("p", "f", &other_key, &diagnostics).is_none());
}
