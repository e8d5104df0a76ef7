//! RocksDB storage implementation.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use bonded_core::{Error, Result};

use crate::batch::{BatchOp, BatchWriter, StorageBatch};
use crate::keyspace::{Direction, KeyRange, Keyspace};
use crate::traits::{KvPair, KvStore};

/// Column family names.
mod cf {
    pub const DEFAULT: &str = "default";
}

/// RocksDB-backed storage. One column family per [`Keyspace`].
pub struct RocksStorage {
    db: Arc<DB>,
}

impl RocksStorage {
    /// Open or create a storage at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening RocksDB at {:?}", path);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = std::iter::once(cf::DEFAULT)
            .chain(Keyspace::ALL.iter().map(|ks| ks.name()))
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors).map_err(|e| {
            Error::Storage {
                code: bonded_core::ErrorCode::StorageInit,
                message: e.to_string(),
                source: Some(Box::new(e)),
            }
        })?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Open with a temporary directory (for testing).
    pub fn open_temp() -> Result<Self> {
        let dir = tempfile::tempdir().map_err(|e| Error::storage(e.to_string()))?;
        let path = dir.path().to_path_buf();
        // Keep the temp dir alive by forgetting it (won't be cleaned up on drop)
        std::mem::forget(dir);
        Self::open(path)
    }

    fn handle(&self, ks: Keyspace) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(ks.name())
            .ok_or_else(|| Error::storage(format!("missing column family: {}", ks)))
    }
}

impl Clone for RocksStorage {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl KvStore for RocksStorage {
    fn get(&self, ks: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.handle(ks)?;
        self.db
            .get_cf(cf, key)
            .map_err(|e| Error::storage(e.to_string()))
    }

    fn put(&self, ks: Keyspace, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.handle(ks)?;
        self.db
            .put_cf(cf, key, value)
            .map_err(|e| Error::storage_write(e.to_string()))
    }

    fn delete(&self, ks: Keyspace, key: &[u8]) -> Result<()> {
        let cf = self.handle(ks)?;
        self.db
            .delete_cf(cf, key)
            .map_err(|e| Error::storage_write(e.to_string()))
    }

    fn scan(
        &self,
        ks: Keyspace,
        range: &KeyRange,
        direction: Direction,
        limit: Option<usize>,
    ) -> Result<Vec<KvPair>> {
        let cf = self.handle(ks)?;
        let mode = match (direction, &range.start, &range.end) {
            (Direction::Forward, Bound::Included(k) | Bound::Excluded(k), _) => {
                IteratorMode::From(k.as_slice(), rocksdb::Direction::Forward)
            }
            (Direction::Forward, Bound::Unbounded, _) => IteratorMode::Start,
            (Direction::Reverse, _, Bound::Included(k) | Bound::Excluded(k)) => {
                IteratorMode::From(k.as_slice(), rocksdb::Direction::Reverse)
            }
            (Direction::Reverse, _, Bound::Unbounded) => IteratorMode::End,
        };

        let limit = limit.unwrap_or(usize::MAX);
        let mut out = Vec::new();
        for item in self.db.iterator_cf(cf, mode) {
            if out.len() >= limit {
                break;
            }
            let (key, value) = item.map_err(|e| Error::storage(e.to_string()))?;
            if range.contains(&key) {
                out.push((key.to_vec(), value.to_vec()));
                continue;
            }
            // Keys equal to an excluded seek bound are skipped; anything
            // else outside the range means the scan has passed its end.
            let at_seek_bound = match direction {
                Direction::Forward => matches!(&range.start, Bound::Excluded(k) if k[..] == key[..]),
                Direction::Reverse => matches!(&range.end, Bound::Excluded(k) if k[..] == key[..]),
            };
            if !at_seek_bound {
                break;
            }
        }
        Ok(out)
    }
}

impl BatchWriter for RocksStorage {
    fn commit(&self, batch: StorageBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.len();
        let mut wb = WriteBatch::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { ks, key, value } => wb.put_cf(self.handle(ks)?, key, value),
                BatchOp::Delete { ks, key } => wb.delete_cf(self.handle(ks)?, key),
            }
        }

        self.db
            .write(wb)
            .map_err(|e| Error::storage_write(e.to_string()))?;
        debug!(ops = count, "Committed batch to RocksDB");
        Ok(())
    }
}
