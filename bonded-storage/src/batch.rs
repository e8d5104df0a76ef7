//! Batch operations for atomic writes.
//!
//! All writes produced while executing one block are collected into a
//! single [`StorageBatch`] and handed to [`BatchWriter::commit`], so a
//! block's effects are either fully persisted or not at all.

use bonded_core::Result;

use crate::keyspace::Keyspace;

/// An operation to include in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Store a value.
    Put {
        ks: Keyspace,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete { ks: Keyspace, key: Vec<u8> },
}

impl BatchOp {
    /// Keyspace the operation touches.
    pub fn keyspace(&self) -> Keyspace {
        match self {
            BatchOp::Put { ks, .. } | BatchOp::Delete { ks, .. } => *ks,
        }
    }
}

/// A batch of operations to commit atomically.
///
/// # Example
///
/// ```
/// use bonded_storage::{BatchWriter, Keyspace, KvStore, MemStorage, StorageBatch};
///
/// let storage = MemStorage::new();
/// let mut batch = StorageBatch::new();
///
/// batch
///     .put(Keyspace::Meta, b"a".to_vec(), b"1".to_vec())
///     .put(Keyspace::Meta, b"b".to_vec(), b"2".to_vec());
///
/// storage.commit(batch).unwrap(); // Atomic write
/// assert!(storage.has(Keyspace::Meta, b"b").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct StorageBatch {
    ops: Vec<BatchOp>,
}

impl StorageBatch {
    /// Create a new empty batch.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Create a batch with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    /// Add a put to the batch.
    pub fn put(&mut self, ks: Keyspace, key: Vec<u8>, value: Vec<u8>) -> &mut Self {
        self.ops.push(BatchOp::Put { ks, key, value });
        self
    }

    /// Add a delete to the batch.
    pub fn delete(&mut self, ks: Keyspace, key: Vec<u8>) -> &mut Self {
        self.ops.push(BatchOp::Delete { ks, key });
        self
    }

    /// Get the number of operations in the batch.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Clear all operations from the batch.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Get the operations in this batch.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Take ownership of the operations.
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Trait for stores that support batch writes.
pub trait BatchWriter {
    /// Create a new batch for this store.
    fn batch(&self) -> StorageBatch {
        StorageBatch::new()
    }

    /// Commit a batch of operations atomically. Operations apply in order,
    /// so a later write to the same key wins.
    fn commit(&self, batch: StorageBatch) -> Result<()>;
}
