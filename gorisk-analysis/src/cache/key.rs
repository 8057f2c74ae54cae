//! The cache key (spec §4.8) and its digest.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use gorisk_core::types::ir::{Context, Symbol};

/// Identifies one cached [`super::CachedSummary`] entry. Field order is
/// fixed by this struct's declaration, so the canonical-JSON serialization
/// used for hashing is stable across runs (spec §9 Open Question,
/// resolved: whole-key canonical JSON digested with `xxh3_64`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKey {
    pub function: Symbol,
    pub context: Context,
    pub direct_caps_hash: String,
    pub callee_hashes: Vec<String>,
    pub code_hash: String,
}

impl CacheKey {
    /// `xxh3_64` digest of this key's canonical JSON form, truncated to 16
    /// hex characters (spec §4.8: "truncated to 16 hex chars for
    /// filesystem friendliness").
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_vec(self).expect("CacheKey always serializes");
        format!("{:016x}", xxh3_64(&canonical))
    }
}

/// `codeHash` (spec §4.8): concatenate, in sorted filename order, each
/// file's name, a NUL byte, its contents (or nothing if unreadable), and
/// another NUL byte; digest the result. Missing files still contribute
/// their name so renames invalidate the hash.
pub fn code_hash(files: &[(String, Option<Vec<u8>>)]) -> String {
    let mut sorted: Vec<&(String, Option<Vec<u8>>)> = files.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut buf = Vec::new();
    for (name, contents) in sorted {
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        if let Some(bytes) = contents {
            buf.extend_from_slice(bytes);
        }
        buf.push(0);
    }
    format!("{:016x}", xxh3_64(&buf))
}

/// A simple content hash for a serializable value, used for
/// `direct_caps_hash` and per-callee `calleeHashes` entries.
pub fn hash_value<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).expect("value always serializes");
    format!("{:016x}", xxh3_64(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorisk_core::types::ir::SymbolKind;

    fn key() -> CacheKey {
        CacheKey {
            function: Symbol::new("p", "f", SymbolKind::Func),
            context: Context::Unit,
            direct_caps_hash: "abc".into(),
            callee_hashes: vec!["def".into()],
            code_hash: "ghi".into(),
        }
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(key().digest(), key().digest());
    }

    #[test]
    fn digest_is_sixteen_hex_chars() {
        let d = key().digest();
        assert_eq!(d.len(), 16);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_changes_when_code_hash_changes() {
        let mut k2 = key();
        k2.code_hash = "different".into();
        assert_ne!(key().digest(), k2.digest());
    }

    #[test]
    fn code_hash_is_order_independent_of_input_slice_order() {
        let a = vec![
            ("a.go".to_string(), Some(b"one".to_vec())),
            ("b.go".to_string(), Some(b"two".to_vec())),
        ];
        let b = vec![
            ("b.go".to_string(), Some(b"two".to_vec())),
            ("a.go".to_string(), Some(b"one".to_vec())),
        ];
        assert_eq!(code_hash(&a), code_hash(&b));
    }

    #[test]
    fn code_hash_distinguishes_rename_from_missing_file() {
        let original = vec![("a.go".to_string(), Some(b"x".to_vec()))];
        let renamed = vec![("b.go".to_string(), Some(b"x".to_vec()))];
        let missing = vec![("a.go".to_string(), None)];
        assert_ne!(code_hash(&original), code_hash(&renamed));
        assert_ne!(code_hash(&original), code_hash(&missing));
    }
}
