//! Validator record store and its secondary indices.
//!
//! Records live under their operator address. Two indices follow them:
//! the consensus-address index (refreshed on every write) and the power
//! index, which callers must delete before changing power or status and
//! re-insert afterwards because its key embeds both.

use std::collections::BTreeMap;

use tracing::{debug, info};

use bonded_core::{
    violated, BlockContext, Commission, CommissionError, ConsIdentity, Dec, Description,
    InvariantViolation, ValAddress, Validator,
};
use bonded_storage::{BatchWriter, Direction, KeyRange, Keyspace, KvStore};

use crate::error::{Result, StakingError};
use crate::events::StakeEvent;
use crate::keeper::{decode, Keeper};
use crate::keys;

impl<S: KvStore + BatchWriter> Keeper<S> {
    // ========================================================================
    // Lookups
    // ========================================================================

    /// Get a validator by operator address.
    pub fn get_validator(&self, operator: &ValAddress) -> Result<Option<Validator>> {
        self.read(Keyspace::Validators, operator.as_bytes())
    }

    /// Get a validator that must exist. A missing record is fatal.
    pub fn must_get_validator(&self, operator: &ValAddress) -> Result<Validator> {
        match self.get_validator(operator)? {
            Some(validator) => Ok(validator),
            None => violated(InvariantViolation::new(
                "validator_record",
                format!("validator record not found for address {operator}"),
            )),
        }
    }

    /// Get a validator by consensus address (main chain) or side-chain
    /// consensus address bytes.
    ///
    /// An index entry pointing at a missing record is fatal.
    pub fn get_validator_by_cons_addr(&self, cons_addr: &[u8]) -> Result<Option<Validator>> {
        let Some(operator_bytes) = self.store.get(Keyspace::ValidatorsByConsAddr, cons_addr)?
        else {
            return Ok(None);
        };
        let operator = ValAddress::from_slice(&operator_bytes)?;
        match self.get_validator(&operator)? {
            Some(validator) => Ok(Some(validator)),
            None => violated(InvariantViolation::new(
                "cons_addr_index",
                format!(
                    "consensus address {} points at missing validator {operator}",
                    hex::encode(cons_addr)
                ),
            )),
        }
    }

    /// Get a validator by consensus address that must exist.
    pub fn must_get_validator_by_cons_addr(&self, cons_addr: &[u8]) -> Result<Validator> {
        match self.get_validator_by_cons_addr(cons_addr)? {
            Some(validator) => Ok(validator),
            None => violated(InvariantViolation::new(
                "validator_record",
                format!("validator with consensus address {} not found", hex::encode(cons_addr)),
            )),
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Write the full record and refresh its consensus-address index entry.
    /// Fires no hook.
    pub fn set_validator(&mut self, ctx: &BlockContext, validator: &Validator) -> Result<()> {
        self.write(Keyspace::Validators, validator.operator.as_bytes(), validator)?;
        self.store.put(
            Keyspace::ValidatorsByConsAddr,
            &validator.cons_identity.index_key(),
            validator.operator.as_bytes(),
        )?;
        self.record_event(ctx, |is_from_tx| StakeEvent::ValidatorUpdated {
            validator: Box::new(validator.clone()),
            is_from_tx,
        });
        Ok(())
    }

    /// Insert the power-index entry. Jailed validators are never indexed.
    pub fn set_validator_by_power_index(&self, validator: &Validator) -> Result<()> {
        if validator.jailed {
            return Ok(());
        }
        self.set_new_validator_by_power_index(validator)
    }

    /// Insert the power-index entry unconditionally, for a validator that
    /// was just created.
    pub fn set_new_validator_by_power_index(&self, validator: &Validator) -> Result<()> {
        self.store.put(
            Keyspace::ValidatorsByPower,
            &keys::power_key(validator),
            validator.operator.as_bytes(),
        )?;
        Ok(())
    }

    /// Delete the power-index entry derived from `validator`'s current
    /// power, bond height and counter.
    pub fn delete_validator_by_power_index(&self, validator: &Validator) -> Result<()> {
        self.store
            .delete(Keyspace::ValidatorsByPower, &keys::power_key(validator))?;
        Ok(())
    }

    /// Delete a validator and all of its index entries, then fire
    /// `on_validator_removed`. Removing an unknown validator is a no-op.
    pub fn remove_validator(&mut self, ctx: &BlockContext, operator: &ValAddress) -> Result<()> {
        let Some(validator) = self.get_validator(operator)? else {
            return Ok(());
        };

        self.store.delete(Keyspace::Validators, operator.as_bytes())?;
        self.store.delete(
            Keyspace::ValidatorsByConsAddr,
            &validator.cons_identity.index_key(),
        )?;
        self.delete_validator_by_power_index(&validator)?;
        if validator.is_unbonding() {
            self.delete_validator_queue(&validator)?;
        }

        info!(operator = %operator, height = ctx.height(), "Removed validator");
        self.hooks
            .validator_removed(ctx, &validator.cons_identity, operator);

        let side_chain_id = match &validator.cons_identity {
            ConsIdentity::SideChain { chain_id, .. } => Some(chain_id.clone()),
            ConsIdentity::Main(_) => None,
        };
        self.record_event(ctx, |is_from_tx| StakeEvent::ValidatorRemoved {
            operator: *operator,
            side_chain_id,
            is_from_tx,
        });
        Ok(())
    }

    // ========================================================================
    // Tokens and shares
    // ========================================================================

    /// Add delegated tokens to a validator, returning the updated record and
    /// the shares issued. Assigns a fresh intra-tx counter so that among
    /// equal-power validators the one changed least recently ranks first.
    pub fn add_validator_tokens_and_shares(
        &mut self,
        ctx: &BlockContext,
        operator: &ValAddress,
        amount: Dec,
    ) -> Result<(Validator, Dec)> {
        if !amount.is_positive() {
            return Err(StakingError::NonPositiveAmount(amount.to_string()));
        }
        let validator = self
            .get_validator(operator)?
            .ok_or(StakingError::ValidatorNotFound(*operator))?;

        let pool = self.pool()?;
        self.delete_validator_by_power_index(&validator)?;
        let (mut validator, pool, issued_shares) = validator.add_tokens_from_del(pool, amount);
        validator.bond_intra_tx_counter = self.next_intra_tx_counter()?;
        self.set_validator(ctx, &validator)?;
        self.set_pool(pool)?;
        self.set_validator_by_power_index(&validator)?;

        debug!(operator = %operator, %amount, shares = %issued_shares, "Added validator tokens");
        Ok((validator, issued_shares))
    }

    /// Remove delegator shares from a validator, returning the updated record
    /// and the tokens released. Like every token change, this takes a fresh
    /// intra-tx counter.
    pub fn remove_validator_tokens_and_shares(
        &mut self,
        ctx: &BlockContext,
        operator: &ValAddress,
        shares: Dec,
    ) -> Result<(Validator, Dec)> {
        if !shares.is_positive() {
            return Err(StakingError::NonPositiveAmount(shares.to_string()));
        }
        let validator = self
            .get_validator(operator)?
            .ok_or(StakingError::ValidatorNotFound(*operator))?;

        let pool = self.pool()?;
        self.delete_validator_by_power_index(&validator)?;
        let (mut validator, pool, removed_tokens) = validator.remove_del_shares(pool, shares);
        validator.bond_intra_tx_counter = self.next_intra_tx_counter()?;
        self.set_validator(ctx, &validator)?;
        self.set_pool(pool)?;
        self.set_validator_by_power_index(&validator)?;

        debug!(operator = %operator, %shares, tokens = %removed_tokens, "Removed validator shares");
        Ok((validator, removed_tokens))
    }

    /// Remove tokens without touching shares, as slashing does.
    pub fn remove_validator_tokens(
        &mut self,
        ctx: &BlockContext,
        operator: &ValAddress,
        tokens: Dec,
    ) -> Result<Validator> {
        if !tokens.is_positive() {
            return Err(StakingError::NonPositiveAmount(tokens.to_string()));
        }
        let validator = self
            .get_validator(operator)?
            .ok_or(StakingError::ValidatorNotFound(*operator))?;

        let pool = self.pool()?;
        self.delete_validator_by_power_index(&validator)?;
        let (mut validator, pool) = validator.remove_tokens(pool, tokens);
        validator.bond_intra_tx_counter = self.next_intra_tx_counter()?;
        self.set_validator(ctx, &validator)?;
        self.set_pool(pool)?;
        self.set_validator_by_power_index(&validator)?;

        debug!(operator = %operator, %tokens, "Removed validator tokens");
        Ok(validator)
    }

    // ========================================================================
    // Creation and commission
    // ========================================================================

    /// Register a new, unbonded validator without stake.
    pub fn create_validator(
        &mut self,
        ctx: &BlockContext,
        operator: ValAddress,
        cons_identity: ConsIdentity,
        description: Description,
        commission: Commission,
    ) -> Result<Validator> {
        if self.store.has(Keyspace::Validators, operator.as_bytes())? {
            return Err(StakingError::ValidatorExists(operator));
        }
        let index_key = cons_identity.index_key();
        if self.store.has(Keyspace::ValidatorsByConsAddr, &index_key)? {
            return Err(StakingError::ConsensusAddressInUse(hex::encode(&index_key)));
        }
        description.ensure_length()?;
        commission.validate()?;

        let commission = Commission {
            update_time: ctx.time(),
            ..commission
        };
        let validator = Validator::new(operator, cons_identity, description, commission);
        self.set_validator(ctx, &validator)?;
        self.set_new_validator_by_power_index(&validator)?;
        self.hooks.validator_created(ctx, &operator);

        info!(operator = %operator, height = ctx.height(), "Created validator");
        Ok(validator)
    }

    /// Validate a commission rate change and return the commission that
    /// would result. Nothing is written.
    pub fn update_validator_commission(
        &self,
        ctx: &BlockContext,
        validator: &Validator,
        new_rate: Dec,
    ) -> std::result::Result<Commission, CommissionError> {
        let mut commission = validator.commission;
        commission.validate_new_rate(new_rate, ctx.time())?;
        commission.rate = new_rate;
        commission.update_time = ctx.time();
        Ok(commission)
    }

    /// Change a validator's commission rate and fire `on_validator_modified`.
    /// On error the validator is left unchanged.
    pub fn edit_validator_commission(
        &mut self,
        ctx: &BlockContext,
        operator: &ValAddress,
        new_rate: Dec,
    ) -> Result<Validator> {
        let mut validator = self
            .get_validator(operator)?
            .ok_or(StakingError::ValidatorNotFound(*operator))?;
        validator.commission = self.update_validator_commission(ctx, &validator, new_rate)?;
        self.set_validator(ctx, &validator)?;
        self.hooks.validator_modified(ctx, operator);
        Ok(validator)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Every validator, ordered by operator address.
    pub fn get_all_validators(&self) -> Result<Vec<Validator>> {
        self.get_validators_limited(None)
    }

    /// Up to `max_retrieve` validators, ordered by operator address.
    pub fn get_validators(&self, max_retrieve: u16) -> Result<Vec<Validator>> {
        self.get_validators_limited(Some(max_retrieve as usize))
    }

    fn get_validators_limited(&self, limit: Option<usize>) -> Result<Vec<Validator>> {
        self.store
            .scan(Keyspace::Validators, &KeyRange::all(), Direction::Forward, limit)?
            .iter()
            .map(|(_, value)| decode(Keyspace::Validators, value))
            .collect()
    }

    /// Power of `operator` as reported to consensus at the end of the last
    /// block, if it was in the bonded set.
    pub fn get_last_validator_power(&self, operator: &ValAddress) -> Result<Option<i64>> {
        self.read(Keyspace::LastValidatorPower, operator.as_bytes())
    }

    pub(crate) fn set_last_validator_power(&self, operator: &ValAddress, power: i64) -> Result<()> {
        self.write(Keyspace::LastValidatorPower, operator.as_bytes(), &power)
    }

    pub(crate) fn delete_last_validator_power(&self, operator: &ValAddress) -> Result<()> {
        self.store
            .delete(Keyspace::LastValidatorPower, operator.as_bytes())?;
        Ok(())
    }

    /// The last reported bonded set as operator -> power.
    pub fn get_last_validator_powers(&self) -> Result<BTreeMap<ValAddress, i64>> {
        self.store
            .scan(Keyspace::LastValidatorPower, &KeyRange::all(), Direction::Forward, None)?
            .iter()
            .map(|(key, value)| -> Result<(ValAddress, i64)> {
                let operator = ValAddress::from_slice(key)?;
                let power: i64 = decode(Keyspace::LastValidatorPower, value)?;
                Ok((operator, power))
            })
            .collect()
    }

    /// Validators of the last reported bonded set, ordered by operator
    /// address. More entries than `max_validators` is fatal.
    pub fn get_last_validators(&self) -> Result<Vec<Validator>> {
        let max = self.params()?.max_validators as usize;
        let last = self.get_last_validator_powers()?;
        if last.len() > max {
            violated(InvariantViolation::new(
                "last_validator_set",
                format!("{} bonded validators exceed the cap of {max}", last.len()),
            ));
        }
        last.keys()
            .map(|operator| self.must_get_validator(operator))
            .collect()
    }

    /// Bonded validators in power order, at most `max_validators`.
    pub fn get_bonded_validators_by_power(&self) -> Result<Vec<Validator>> {
        let max = self.params()?.max_validators as usize;
        let mut validators = Vec::with_capacity(max);
        for (_, operator_bytes) in self.store.scan(
            Keyspace::ValidatorsByPower,
            &KeyRange::all(),
            Direction::Reverse,
            None,
        )? {
            if validators.len() >= max {
                break;
            }
            let operator = ValAddress::from_slice(&operator_bytes)?;
            let validator = self.must_get_validator(&operator)?;
            if validator.is_bonded() {
                validators.push(validator);
            }
        }
        Ok(validators)
    }
}
