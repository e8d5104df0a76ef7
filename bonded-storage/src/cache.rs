//! Per-block write cache.
//!
//! [`CacheStore`] buffers every write of a block on top of a backend store.
//! Reads see the buffered writes. At the end of the block the buffer is
//! either written to the backend as one [`StorageBatch`] or discarded, so
//! a failed block leaves the backend untouched.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use bonded_core::Result;

use crate::batch::{BatchWriter, StorageBatch};
use crate::keyspace::{Direction, KeyRange, Keyspace};
use crate::mem::scan_table;
use crate::traits::{KvPair, KvStore};

/// Pending value for a key: `None` marks a delete.
type Overlay = BTreeMap<Keyspace, BTreeMap<Vec<u8>, Option<Vec<u8>>>>;

/// Write-buffering overlay over a backend store.
#[derive(Debug)]
pub struct CacheStore<S> {
    backend: S,
    pending: RwLock<Overlay>,
}

impl<S: KvStore + BatchWriter> CacheStore<S> {
    /// Wrap a backend with an empty cache.
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            pending: RwLock::new(BTreeMap::new()),
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Number of buffered writes.
    pub fn pending_len(&self) -> usize {
        self.pending.read().values().map(BTreeMap::len).sum()
    }

    /// Whether any write is buffered.
    pub fn is_dirty(&self) -> bool {
        self.pending_len() > 0
    }

    /// Write every buffered change to the backend in one atomic batch.
    ///
    /// Returns the number of operations written. On error the buffer is
    /// kept so the caller may retry or discard.
    pub fn write(&self) -> Result<usize> {
        let mut pending = self.pending.write();
        let batch = batch_from(&pending);
        let count = batch.len();
        if count > 0 {
            self.backend.commit(batch)?;
        }
        pending.clear();
        debug!(ops = count, "Flushed block cache");
        Ok(count)
    }

    /// Drop every buffered change.
    pub fn discard(&self) {
        let mut pending = self.pending.write();
        let count: usize = pending.values().map(BTreeMap::len).sum();
        pending.clear();
        debug!(ops = count, "Discarded block cache");
    }

    /// Build a batch of the buffered changes without applying them.
    pub fn pending_batch(&self) -> StorageBatch {
        batch_from(&self.pending.read())
    }
}

fn batch_from(pending: &Overlay) -> StorageBatch {
    let mut batch = StorageBatch::new();
    for (ks, table) in pending {
        for (key, value) in table {
            match value {
                Some(value) => batch.put(*ks, key.clone(), value.clone()),
                None => batch.delete(*ks, key.clone()),
            };
        }
    }
    batch
}

impl<S: KvStore + BatchWriter> KvStore for CacheStore<S> {
    fn get(&self, ks: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.pending.read().get(&ks).and_then(|t| t.get(key)) {
            return Ok(value.clone());
        }
        self.backend.get(ks, key)
    }

    fn put(&self, ks: Keyspace, key: &[u8], value: &[u8]) -> Result<()> {
        self.pending
            .write()
            .entry(ks)
            .or_default()
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, ks: Keyspace, key: &[u8]) -> Result<()> {
        self.pending
            .write()
            .entry(ks)
            .or_default()
            .insert(key.to_vec(), None);
        Ok(())
    }

    fn scan(
        &self,
        ks: Keyspace,
        range: &KeyRange,
        direction: Direction,
        limit: Option<usize>,
    ) -> Result<Vec<KvPair>> {
        let pending = self.pending.read();
        let overlay: Vec<(&Vec<u8>, &Option<Vec<u8>>)> = pending
            .get(&ks)
            .map(|t| t.range::<[u8], _>(range.as_bounds()).collect())
            .unwrap_or_default();

        // Each buffered delete can hide at most one backend entry.
        let backend_limit = limit.map(|l| l.saturating_add(overlay.len()));
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .backend
            .scan(ks, range, direction, backend_limit)?
            .into_iter()
            .collect();

        for (key, value) in overlay {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(scan_table(&merged, &KeyRange::all(), direction, limit))
    }
}
