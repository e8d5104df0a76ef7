//! End-of-block validator set reconciliation.

use tracing::info;

use bonded_core::{
    violated, BlockContext, BondStatus, InvariantViolation, ValAddress, Validator,
    ValidatorUpdate,
};
use bonded_storage::{BatchWriter, Direction, KeyRange, Keyspace, KvStore};

use crate::error::Result;
use crate::keeper::Keeper;

impl<S: KvStore + BatchWriter> Keeper<S> {
    /// Bring the bonded set in line with the power index and return the new
    /// bonded set together with the consensus updates it implies.
    ///
    /// The top `max_validators` validators of the power index become (or
    /// stay) Bonded; an update is emitted for each whose power differs from
    /// the last reported one. Validators of the last set that fell out begin
    /// unbonding and get a zero-power update, in operator address order.
    /// Side-chain validators change state but are never reported.
    pub fn apply_and_return_validator_set_updates(
        &mut self,
        ctx: &BlockContext,
    ) -> Result<(Vec<Validator>, Vec<ValidatorUpdate>)> {
        let max_validators = self.params()?.max_validators as usize;
        let mut remaining = self.get_last_validator_powers()?;

        // Bonding re-keys the power entry, so take the candidates up front.
        let candidates = self.store.scan(
            Keyspace::ValidatorsByPower,
            &KeyRange::all(),
            Direction::Reverse,
            Some(max_validators),
        )?;

        let mut bonded = Vec::with_capacity(max_validators);
        let mut updates = Vec::new();
        let mut total_power: i64 = 0;

        for (_, operator_bytes) in candidates {
            let operator = ValAddress::from_slice(&operator_bytes)?;
            let validator = self.must_get_validator(&operator)?;

            if validator.jailed {
                violated(
                    InvariantViolation::new(
                        "power_index",
                        format!("jailed validator {operator} found in power index"),
                    )
                    .at_height(ctx.height()),
                );
            }
            // Nothing below a zero-power validator can be bonded either.
            if validator.potential_power() == 0 {
                break;
            }

            let validator = match validator.status {
                BondStatus::Unbonded => self.unbonded_to_bonded(ctx, validator)?,
                BondStatus::Unbonding => self.unbonding_to_bonded(ctx, validator)?,
                BondStatus::Bonded => validator,
            };

            let new_power = validator.power();
            if remaining.get(&operator) != Some(&new_power) {
                updates.extend(validator.abci_update());
                self.set_last_validator_power(&operator, new_power)?;
            }
            remaining.remove(&operator);

            total_power = match total_power.checked_add(new_power) {
                Some(total) => total,
                None => violated(InvariantViolation::new(
                    "total_power",
                    "bonded power overflows i64",
                )),
            };
            bonded.push(validator);
        }

        // BTreeMap iteration is already operator address order.
        let mut unbonded = 0usize;
        for operator in remaining.into_keys() {
            let validator = self.must_get_validator(&operator)?;
            let validator = self.bonded_to_unbonding(ctx, validator)?;

            if validator.delegator_shares.is_zero() {
                self.remove_validator(ctx, &operator)?;
            }
            self.delete_last_validator_power(&operator)?;
            updates.extend(validator.abci_update_zero());
            unbonded += 1;
        }

        if !updates.is_empty() {
            self.set_last_total_power(total_power)?;
        }

        info!(
            height = ctx.height(),
            bonded = bonded.len(),
            unbonded,
            updates = updates.len(),
            total_power,
            "Applied validator set updates"
        );
        Ok((bonded, updates))
    }
}
