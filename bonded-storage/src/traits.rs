//! Storage traits.

use bonded_core::Result;

use crate::keyspace::{Direction, KeyRange, Keyspace};

/// A key/value pair returned by a scan.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Ordered key-value store split into [`Keyspace`]s.
///
/// Methods take `&self`; implementations synchronize internally.
pub trait KvStore {
    /// Get a value by key.
    fn get(&self, ks: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Check if a key exists.
    fn has(&self, ks: Keyspace, key: &[u8]) -> Result<bool> {
        Ok(self.get(ks, key)?.is_some())
    }

    /// Store a value.
    fn put(&self, ks: Keyspace, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, ks: Keyspace, key: &[u8]) -> Result<()>;

    /// Collect up to `limit` entries in `range`, ordered by key in the
    /// given direction.
    fn scan(
        &self,
        ks: Keyspace,
        range: &KeyRange,
        direction: Direction,
        limit: Option<usize>,
    ) -> Result<Vec<KvPair>>;
}
