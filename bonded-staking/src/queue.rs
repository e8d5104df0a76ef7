//! Unbonding queue.
//!
//! Validators that begin unbonding are appended to the timeslice keyed by
//! their `unbonding_min_time`. Every Unbonding validator appears in exactly
//! one timeslice; leaving Unbonding removes it again.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use bonded_core::{BlockContext, ValAddress, Validator};
use bonded_storage::{BatchWriter, Direction, KeyRange, Keyspace, KvStore};

use crate::error::Result;
use crate::keeper::{decode, Keeper};
use crate::keys;

impl<S: KvStore + BatchWriter> Keeper<S> {
    /// Operators queued to mature at exactly `time`.
    pub fn get_validator_queue_timeslice(&self, time: DateTime<Utc>) -> Result<Vec<ValAddress>> {
        Ok(self
            .read(Keyspace::ValidatorQueue, &keys::queue_key(time))?
            .unwrap_or_default())
    }

    /// Replace the timeslice at `time`. An empty slice deletes the entry.
    pub fn set_validator_queue_timeslice(
        &self,
        time: DateTime<Utc>,
        operators: &[ValAddress],
    ) -> Result<()> {
        let key = keys::queue_key(time);
        if operators.is_empty() {
            self.store.delete(Keyspace::ValidatorQueue, &key)?;
            return Ok(());
        }
        self.write(Keyspace::ValidatorQueue, &key, &operators)
    }

    /// Append `validator` to the timeslice of its unbonding time.
    pub fn insert_validator_queue(&self, validator: &Validator) -> Result<()> {
        let mut slice = self.get_validator_queue_timeslice(validator.unbonding_min_time)?;
        if !slice.contains(&validator.operator) {
            slice.push(validator.operator);
        }
        self.set_validator_queue_timeslice(validator.unbonding_min_time, &slice)
    }

    /// Remove `validator` from the timeslice of its unbonding time.
    pub fn delete_validator_queue(&self, validator: &Validator) -> Result<()> {
        let mut slice = self.get_validator_queue_timeslice(validator.unbonding_min_time)?;
        slice.retain(|op| op != &validator.operator);
        self.set_validator_queue_timeslice(validator.unbonding_min_time, &slice)
    }

    /// Every queued operator whose maturity time is at or before `now`, in
    /// maturity order, with the timeslice keys they were found under.
    pub fn get_all_mature_validator_queue(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Vec<u8>, Vec<ValAddress>)>> {
        self.store
            .scan(
                Keyspace::ValidatorQueue,
                &KeyRange::up_to_inclusive(keys::queue_key(now)),
                Direction::Forward,
                None,
            )?
            .into_iter()
            .map(|(key, value)| -> Result<(Vec<u8>, Vec<ValAddress>)> {
                let operators = decode(Keyspace::ValidatorQueue, &value)?;
                Ok((key, operators))
            })
            .collect()
    }

    /// Complete unbonding for every validator whose time has come.
    ///
    /// Operators that no longer exist or are no longer Unbonding are
    /// skipped. A matured validator without delegator shares is removed.
    /// Returns the operators that completed unbonding.
    pub fn drain_matured(&mut self, ctx: &BlockContext) -> Result<Vec<ValAddress>> {
        let mut completed = Vec::new();

        for (key, operators) in self.get_all_mature_validator_queue(ctx.time())? {
            for operator in operators {
                let Some(validator) = self.get_validator(&operator)? else {
                    debug!(operator = %operator, "Queued validator no longer exists");
                    continue;
                };
                if !validator.is_unbonding() {
                    debug!(operator = %operator, status = %validator.status, "Queued validator not unbonding");
                    continue;
                }

                let validator = self.unbonding_to_unbonded(ctx, validator)?;
                if validator.delegator_shares.is_zero() {
                    self.remove_validator(ctx, &validator.operator)?;
                }
                completed.push(operator);
            }
            self.store.delete(Keyspace::ValidatorQueue, &key)?;
        }

        if !completed.is_empty() {
            info!(count = completed.len(), height = ctx.height(), "Completed validator unbonding");
        }
        Ok(completed)
    }
}
