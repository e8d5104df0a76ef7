//! Validator status transitions and jailing.
//!
//! ```text
//!              bond                 begin unbonding
//!  Unbonded ─────────► Bonded ──────────────────► Unbonding
//!      ▲                 ▲                            │
//!      │                 └──────── bond ──────────────┤
//!      └────────────── complete (queue matured) ──────┘
//! ```
//!
//! Each checked wrapper asserts the source status; a mismatch means the
//! caller's view of the store is wrong and aborts the block.

use tracing::{debug, info};

use bonded_core::{violated, BlockContext, BondStatus, InvariantViolation, Validator};
use bonded_storage::{BatchWriter, KvStore};

use crate::error::{Result, StakingError};
use crate::keeper::Keeper;

impl<S: KvStore + BatchWriter> Keeper<S> {
    pub(crate) fn unbonded_to_bonded(&mut self, ctx: &BlockContext, validator: Validator) -> Result<Validator> {
        expect_status("unbonded_to_bonded", &validator, BondStatus::Unbonded);
        self.bond_validator(ctx, validator)
    }

    pub(crate) fn unbonding_to_bonded(&mut self, ctx: &BlockContext, validator: Validator) -> Result<Validator> {
        expect_status("unbonding_to_bonded", &validator, BondStatus::Unbonding);
        self.bond_validator(ctx, validator)
    }

    pub(crate) fn bonded_to_unbonding(&mut self, ctx: &BlockContext, validator: Validator) -> Result<Validator> {
        expect_status("bonded_to_unbonding", &validator, BondStatus::Bonded);
        self.begin_unbonding_validator(ctx, validator)
    }

    pub(crate) fn unbonding_to_unbonded(&mut self, ctx: &BlockContext, validator: Validator) -> Result<Validator> {
        expect_status("unbonding_to_unbonded", &validator, BondStatus::Unbonding);
        self.complete_unbonding_validator(ctx, validator)
    }

    fn bond_validator(&mut self, ctx: &BlockContext, validator: Validator) -> Result<Validator> {
        let pool = self.pool()?;
        self.delete_validator_by_power_index(&validator)?;
        if validator.is_unbonding() {
            self.delete_validator_queue(&validator)?;
        }

        let mut validator = validator;
        validator.bond_height = ctx.height();
        let (validator, pool) = validator.update_status(pool, BondStatus::Bonded);
        self.set_pool(pool)?;
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(&validator)?;

        info!(
            operator = %validator.operator,
            power = validator.power(),
            height = ctx.height(),
            "Validator bonded"
        );
        self.hooks
            .validator_bonded(ctx, &validator.cons_identity, &validator.operator);
        Ok(validator)
    }

    fn begin_unbonding_validator(&mut self, ctx: &BlockContext, validator: Validator) -> Result<Validator> {
        let pool = self.pool()?;
        let unbonding_period = self.params()?.unbonding_period()?;
        self.delete_validator_by_power_index(&validator)?;

        let (mut validator, pool) = validator.update_status(pool, BondStatus::Unbonding);
        validator.unbonding_min_time = match ctx.time().checked_add_signed(unbonding_period) {
            Some(time) => time,
            None => violated(
                InvariantViolation::new(
                    "unbonding_time",
                    format!("block time {} plus unbonding period overflows", ctx.time()),
                )
                .at_height(ctx.height()),
            ),
        };
        validator.unbonding_height = ctx.height();

        self.set_pool(pool)?;
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(&validator)?;
        self.insert_validator_queue(&validator)?;

        info!(
            operator = %validator.operator,
            matures_at = %validator.unbonding_min_time,
            height = ctx.height(),
            "Validator began unbonding"
        );
        self.hooks
            .validator_begin_unbonding(ctx, &validator.cons_identity, &validator.operator);
        Ok(validator)
    }

    fn complete_unbonding_validator(&mut self, ctx: &BlockContext, validator: Validator) -> Result<Validator> {
        let pool = self.pool()?;
        let (validator, pool) = validator.update_status(pool, BondStatus::Unbonded);
        self.set_pool(pool)?;
        self.set_validator(ctx, &validator)?;
        debug!(operator = %validator.operator, "Validator unbonded");
        Ok(validator)
    }

    /// Jail a validator: it leaves the power index and therefore the next
    /// bonded set. Jailing a jailed validator is fatal.
    pub fn jail_validator(&mut self, ctx: &BlockContext, mut validator: Validator) -> Result<Validator> {
        if validator.jailed {
            violated(
                InvariantViolation::new(
                    "jail",
                    format!("cannot jail already jailed validator {}", validator.operator),
                )
                .at_height(ctx.height()),
            );
        }
        validator.jailed = true;
        self.set_validator(ctx, &validator)?;
        self.delete_validator_by_power_index(&validator)?;
        info!(operator = %validator.operator, height = ctx.height(), "Validator jailed");
        Ok(validator)
    }

    /// Release a validator from jail and restore its power-index entry.
    /// Unjailing a free validator is fatal.
    pub fn unjail_validator(&mut self, ctx: &BlockContext, mut validator: Validator) -> Result<Validator> {
        if !validator.jailed {
            violated(
                InvariantViolation::new(
                    "unjail",
                    format!("cannot unjail validator {} that is not jailed", validator.operator),
                )
                .at_height(ctx.height()),
            );
        }
        validator.jailed = false;
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(&validator)?;
        info!(operator = %validator.operator, height = ctx.height(), "Validator unjailed");
        Ok(validator)
    }

    /// Jail the validator behind a consensus address.
    pub fn jail(&mut self, ctx: &BlockContext, cons_addr: &[u8]) -> Result<Validator> {
        let validator = self.lookup_cons_addr(cons_addr)?;
        self.jail_validator(ctx, validator)
    }

    /// Unjail the validator behind a consensus address.
    pub fn unjail(&mut self, ctx: &BlockContext, cons_addr: &[u8]) -> Result<Validator> {
        let validator = self.lookup_cons_addr(cons_addr)?;
        self.unjail_validator(ctx, validator)
    }

    fn lookup_cons_addr(&self, cons_addr: &[u8]) -> Result<Validator> {
        self.get_validator_by_cons_addr(cons_addr)?
            .ok_or_else(|| StakingError::ConsensusAddressNotFound(hex::encode(cons_addr)))
    }
}

fn expect_status(transition: &str, validator: &Validator, expected: BondStatus) {
    if validator.status != expected {
        violated(InvariantViolation::new(
            "bond_status",
            format!(
                "bad state transition {transition}: validator {} is {}, expected {expected}",
                validator.operator, validator.status
            ),
        ));
    }
}
