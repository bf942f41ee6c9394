//! Write-buffered view over a store for one state transition.
//!
//! Reads fall through to the parent; writes stay in the buffer until
//! [`CacheStore::commit`]. Dropping the cache without committing discards
//! every write, which is how a failed transition is rolled back.

use std::collections::BTreeMap;

use crate::kv::{KvStore, WriteBatch};
use crate::Result;

pub struct CacheStore<'a, S: KvStore + ?Sized> {
    parent: &'a mut S,
    writes: WriteBatch,
}

impl<'a, S: KvStore + ?Sized> CacheStore<'a, S> {
    pub fn new(parent: &'a mut S) -> Self {
        Self {
            parent,
            writes: WriteBatch::new(),
        }
    }

    /// Number of buffered writes (sets and deletes).
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Flush all buffered writes to the parent in a single batch.
    pub fn commit(self) -> Result<()> {
        let count = self.writes.len();
        self.parent.apply(self.writes)?;
        tracing::trace!(writes = count, "cache committed");
        Ok(())
    }

    /// Drop all buffered writes.
    pub fn discard(self) {
        tracing::trace!(writes = self.writes.len(), "cache discarded");
    }
}

impl<S: KvStore + ?Sized> KvStore for CacheStore<'_, S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(buffered) => Ok(buffered.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.scan_prefix(prefix)?.into_iter().collect();
        for (key, value) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        self.writes.extend(batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemStore;

    #[test]
    fn test_reads_see_buffered_writes() {
        let mut parent = MemStore::new();
        parent.set(b"a", b"1").expect("set");

        let mut cache = CacheStore::new(&mut parent);
        cache.set(b"a", b"2").expect("set");
        cache.set(b"b", b"3").expect("set");
        assert_eq!(cache.get(b"a").expect("get"), Some(b"2".to_vec()));
        assert_eq!(cache.get(b"b").expect("get"), Some(b"3".to_vec()));
        cache.delete(b"a").expect("delete");
        assert_eq!(cache.get(b"a").expect("get"), None);
    }

    #[test]
    fn test_discard_leaves_parent_untouched() {
        let mut parent = MemStore::new();
        parent.set(b"a", b"1").expect("set");
        let before = parent.clone();

        let mut cache = CacheStore::new(&mut parent);
        cache.set(b"a", b"changed").expect("set");
        cache.set(b"z", b"new").expect("set");
        cache.discard();

        assert_eq!(parent, before);
    }

    #[test]
    fn test_commit_flushes_writes() {
        let mut parent = MemStore::new();
        parent.set(b"a", b"1").expect("set");

        let mut cache = CacheStore::new(&mut parent);
        cache.set(b"b", b"2").expect("set");
        cache.delete(b"a").expect("delete");
        assert_eq!(cache.pending_writes(), 2);
        cache.commit().expect("commit");

        assert_eq!(parent.get(b"a").expect("get"), None);
        assert_eq!(parent.get(b"b").expect("get"), Some(b"2".to_vec()));
    }

    #[test]
    fn test_scan_merges_overlay() {
        let mut parent = MemStore::new();
        parent.set(&[1, 1], b"p1").expect("set");
        parent.set(&[1, 2], b"p2").expect("set");
        parent.set(&[2, 1], b"other").expect("set");

        let mut cache = CacheStore::new(&mut parent);
        cache.delete(&[1, 1]).expect("delete");
        cache.set(&[1, 3], b"c3").expect("set");
        cache.set(&[1, 2], b"c2").expect("set");

        let scanned = cache.scan_prefix(&[1]).expect("scan");
        assert_eq!(
            scanned,
            vec![(vec![1, 2], b"c2".to_vec()), (vec![1, 3], b"c3".to_vec())]
        );
    }

    #[test]
    fn test_nested_cache_commits_into_outer() {
        let mut parent = MemStore::new();
        let mut outer = CacheStore::new(&mut parent);
        {
            let mut inner = CacheStore::new(&mut outer);
            inner.set(b"k", b"v").expect("set");
            inner.commit().expect("inner commit");
        }
        assert_eq!(outer.get(b"k").expect("get"), Some(b"v".to_vec()));
        outer.commit().expect("outer commit");
        assert_eq!(parent.get(b"k").expect("get"), Some(b"v".to_vec()));
    }
}
