//! Storage layer for the bonded engine.
//!
//! Provides ordered key-value storage split into keyspaces:
//! - Validator records and their consensus-address index
//! - The power-rank index
//! - The last-bonded-set snapshot
//! - The unbonding queue
//! - Validator sets recorded by height
//! - Singletons (pool, params, counters)
//!
//! # Block Cache
//!
//! Writes made while executing a block go through a [`CacheStore`] and reach
//! the backend in one atomic batch:
//!
//! ```
//! use bonded_storage::{CacheStore, Keyspace, KvStore, MemStorage};
//!
//! let backend = MemStorage::new();
//! let cache = CacheStore::new(backend.clone());
//!
//! cache.put(Keyspace::Meta, b"pool", b"...").unwrap();
//! assert!(!backend.has(Keyspace::Meta, b"pool").unwrap());
//!
//! cache.write().unwrap(); // Atomic write
//! assert!(backend.has(Keyspace::Meta, b"pool").unwrap());
//! ```
//!
//! The RocksDB backend is available behind the `rocksdb` feature.

mod batch;
mod cache;
mod keyspace;
mod mem;
#[cfg(feature = "rocksdb")]
mod rocks;
mod traits;

pub use batch::{BatchOp, BatchWriter, StorageBatch};
pub use cache::CacheStore;
pub use keyspace::{Direction, KeyRange, Keyspace};
pub use mem::MemStorage;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksStorage;
pub use traits::{KvPair, KvStore};
