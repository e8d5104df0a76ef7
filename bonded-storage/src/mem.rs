//! In-memory storage backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use bonded_core::Result;

use crate::batch::{BatchOp, BatchWriter, StorageBatch};
use crate::keyspace::{Direction, KeyRange, Keyspace};
use crate::traits::{KvPair, KvStore};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// Ordered in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    tables: Arc<RwLock<BTreeMap<Keyspace, Table>>>,
}

impl MemStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in a keyspace.
    pub fn len(&self, ks: Keyspace) -> usize {
        self.tables.read().get(&ks).map_or(0, BTreeMap::len)
    }

    /// Whether the keyspace holds no keys.
    pub fn is_empty(&self, ks: Keyspace) -> bool {
        self.len(ks) == 0
    }
}

pub(crate) fn scan_table(
    table: &Table,
    range: &KeyRange,
    direction: Direction,
    limit: Option<usize>,
) -> Vec<KvPair> {
    let iter = table.range::<[u8], _>(range.as_bounds());
    let limit = limit.unwrap_or(usize::MAX);
    match direction {
        Direction::Forward => iter
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        Direction::Reverse => iter
            .rev()
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

impl KvStore for MemStorage {
    fn get(&self, ks: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self
            .tables
            .read()
            .get(&ks)
            .and_then(|table| table.get(key).cloned()))
    }

    fn put(&self, ks: Keyspace, key: &[u8], value: &[u8]) -> Result<()> {
        self.tables
            .write()
            .entry(ks)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, ks: Keyspace, key: &[u8]) -> Result<()> {
        if let Some(table) = self.tables.write().get_mut(&ks) {
            table.remove(key);
        }
        Ok(())
    }

    fn scan(
        &self,
        ks: Keyspace,
        range: &KeyRange,
        direction: Direction,
        limit: Option<usize>,
    ) -> Result<Vec<KvPair>> {
        let tables = self.tables.read();
        Ok(tables
            .get(&ks)
            .map(|table| scan_table(table, range, direction, limit))
            .unwrap_or_default())
    }
}

impl BatchWriter for MemStorage {
    fn commit(&self, batch: StorageBatch) -> Result<()> {
        let count = batch.len();
        // One write lock for the whole batch: readers see all of it or none.
        let mut tables = self.tables.write();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { ks, key, value } => {
                    tables.entry(ks).or_default().insert(key, value);
                }
                BatchOp::Delete { ks, key } => {
                    if let Some(table) = tables.get_mut(&ks) {
                        table.remove(&key);
                    }
                }
            }
        }
        debug!(ops = count, "Committed batch to memory store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemStorage::new();
        store.put(Keyspace::Validators, b"a", b"1").unwrap();
        assert_eq!(
            store.get(Keyspace::Validators, b"a").unwrap(),
            Some(b"1".to_vec())
        );
        // Keyspaces are independent.
        assert!(!store.has(Keyspace::Meta, b"a").unwrap());

        store.delete(Keyspace::Validators, b"a").unwrap();
        assert!(store.get(Keyspace::Validators, b"a").unwrap().is_none());
        store.delete(Keyspace::Validators, b"missing").unwrap();
    }

    #[test]
    fn test_scan_order_and_limit() {
        let store = MemStorage::new();
        for k in [3u8, 1, 2, 5, 4] {
            store.put(Keyspace::ValidatorsByPower, &[k], &[k]).unwrap();
        }

        let fwd = store
            .scan(Keyspace::ValidatorsByPower, &KeyRange::all(), Direction::Forward, None)
            .unwrap();
        let keys: Vec<u8> = fwd.iter().map(|(k, _)| k[0]).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5]);

        let rev = store
            .scan(Keyspace::ValidatorsByPower, &KeyRange::all(), Direction::Reverse, Some(2))
            .unwrap();
        let keys: Vec<u8> = rev.iter().map(|(k, _)| k[0]).collect();
        assert_eq!(keys, vec![5, 4]);

        let bounded = store
            .scan(
                Keyspace::ValidatorsByPower,
                &KeyRange::up_to_inclusive(vec![3]),
                Direction::Forward,
                None,
            )
            .unwrap();
        assert_eq!(bounded.len(), 3);
    }

    #[test]
    fn test_batch_commit_applies_in_order() {
        let store = MemStorage::new();
        store.put(Keyspace::Meta, b"gone", b"x").unwrap();

        let mut batch = store.batch();
        batch
            .put(Keyspace::Meta, b"k".to_vec(), b"1".to_vec())
            .put(Keyspace::Meta, b"k".to_vec(), b"2".to_vec())
            .delete(Keyspace::Meta, b"gone".to_vec());
        store.commit(batch).unwrap();

        assert_eq!(store.get(Keyspace::Meta, b"k").unwrap(), Some(b"2".to_vec()));
        assert!(!store.has(Keyspace::Meta, b"gone").unwrap());
        assert_eq!(store.len(Keyspace::Meta), 1);
    }

    #[test]
    fn test_clones_share_data() {
        let a = MemStorage::new();
        let b = a.clone();
        a.put(Keyspace::Meta, b"k", b"v").unwrap();
        assert!(b.has(Keyspace::Meta, b"k").unwrap());
    }
}
