//! Fast, non-cryptographic hash map/set aliases.
//!
//! These are used everywhere a lookup table's iteration order is not
//! semantically meaningful on its own — any traversal that can affect
//! analysis output sorts its keys explicitly before iterating rather than
//! switching to a `BTreeMap` for the hot path.

use rustc_hash::FxHashMap as InnerMap;
use rustc_hash::FxHashSet as InnerSet;

pub type FxHashMap<K, V> = InnerMap<K, V>;
pub type FxHashSet<T> = InnerSet<T>;

/// Returns the keys of `map`, sorted. Use at every traversal boundary whose
/// result can leak into analysis output (report JSON, SARIF, cache files).
pub fn sorted_keys<K: Ord + Clone, V>(map: &FxHashMap<K, V>) -> Vec<K> {
    let mut keys: Vec<K> = map.keys().cloned().collect();
    keys.sort();
    keys
}
