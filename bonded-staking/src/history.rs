//! Validator sets recorded by height.
//!
//! Reward distribution snapshots the bonded set at chosen heights and later
//! pays out against it. Entries are written and pruned by that collaborator;
//! the keeper never records them on its own.

use tracing::debug;

use bonded_core::Validator;
use bonded_storage::{BatchWriter, Direction, KeyRange, Keyspace, KvStore};

use crate::error::Result;
use crate::keeper::{decode, Keeper};
use crate::keys;

impl<S: KvStore + BatchWriter> Keeper<S> {
    pub fn set_validators_by_height(&self, height: u64, validators: &[Validator]) -> Result<()> {
        debug!(height, count = validators.len(), "Recorded validator set");
        self.write(Keyspace::ValidatorsByHeight, &keys::height_key(height), &validators)
    }

    pub fn get_validators_by_height(&self, height: u64) -> Result<Option<Vec<Validator>>> {
        self.read(Keyspace::ValidatorsByHeight, &keys::height_key(height))
    }

    /// The `index`-th most recent recorded set (1 = latest) with its height.
    pub fn get_height_validators_by_index(
        &self,
        index: usize,
    ) -> Result<Option<(u64, Vec<Validator>)>> {
        if index == 0 {
            return Ok(None);
        }
        let entries = self.store.scan(
            Keyspace::ValidatorsByHeight,
            &KeyRange::all(),
            Direction::Reverse,
            Some(index),
        )?;
        match entries.get(index - 1) {
            Some((key, value)) => Ok(Some((
                keys::height_from_key(key)?,
                decode(Keyspace::ValidatorsByHeight, value)?,
            ))),
            None => Ok(None),
        }
    }

    /// The set recorded at the lowest height.
    pub fn get_earliest_validators_with_height(&self) -> Result<Option<Vec<Validator>>> {
        self.store
            .scan(Keyspace::ValidatorsByHeight, &KeyRange::all(), Direction::Forward, Some(1))?
            .first()
            .map(|(_, value)| decode(Keyspace::ValidatorsByHeight, value))
            .transpose()
    }

    pub fn exist_validators_with_height(&self, height: u64) -> Result<bool> {
        Ok(self
            .store
            .has(Keyspace::ValidatorsByHeight, &keys::height_key(height))?)
    }

    /// Whether any set has been recorded at all.
    pub fn exist_height_validators(&self) -> Result<bool> {
        Ok(!self
            .store
            .scan(Keyspace::ValidatorsByHeight, &KeyRange::all(), Direction::Forward, Some(1))?
            .is_empty())
    }

    pub fn remove_validators_by_height(&self, height: u64) -> Result<()> {
        self.store
            .delete(Keyspace::ValidatorsByHeight, &keys::height_key(height))?;
        Ok(())
    }
}
