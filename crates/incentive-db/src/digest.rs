//! Deterministic digest over the full store contents.
//!
//! Two nodes that replayed the same transitions must produce the same
//! digest; any divergence in a single byte of state changes it.

use crate::kv::KvStore;
use crate::Result;

/// blake3 over every `(key, value)` pair in key order, each field prefixed
/// with its little-endian `u64` length.
pub fn state_digest<S: KvStore + ?Sized>(store: &S) -> Result<[u8; 32]> {
    let mut hasher = blake3::Hasher::new();
    for (key, value) in store.scan_prefix(&[])? {
        hasher.update(&(key.len() as u64).to_le_bytes());
        hasher.update(&key);
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(&value);
    }
    Ok(*hasher.finalize().as_bytes())
}
