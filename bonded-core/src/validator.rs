//! The validator record and its pool-aware token arithmetic.
//!
//! Methods here are pure: they take the record and the [`Pool`] by value and
//! return updated copies. Persisting them, and keeping the indices in step,
//! is the keeper's job.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::{ConsAddress, ConsPubKey, ValAddress};
use crate::commission::Commission;
use crate::dec::Dec;
use crate::error::{Error, Result};
use crate::invariant::{violated, InvariantViolation};
use crate::pool::Pool;
use crate::update::ValidatorUpdate;

/// Lifecycle state of a validator's stake commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BondStatus {
    Unbonded,
    Unbonding,
    Bonded,
}

impl fmt::Display for BondStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BondStatus::Unbonded => "Unbonded",
            BondStatus::Unbonding => "Unbonding",
            BondStatus::Bonded => "Bonded",
        };
        f.write_str(s)
    }
}

/// How the consensus layer identifies a validator.
///
/// Main-chain validators carry a consensus key and are reported to the
/// consensus engine. Side-chain validators only carry the address used on
/// their own chain and never produce a [`ValidatorUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsIdentity {
    Main(ConsPubKey),
    SideChain { chain_id: String, cons_addr: Vec<u8> },
}

impl ConsIdentity {
    /// Bytes under which the consensus-address index stores this validator.
    pub fn index_key(&self) -> Vec<u8> {
        match self {
            ConsIdentity::Main(key) => key.address().as_bytes().to_vec(),
            ConsIdentity::SideChain { cons_addr, .. } => cons_addr.clone(),
        }
    }

    /// The consensus key, for main-chain validators.
    pub fn pub_key(&self) -> Option<&ConsPubKey> {
        match self {
            ConsIdentity::Main(key) => Some(key),
            ConsIdentity::SideChain { .. } => None,
        }
    }

    /// The consensus address, for main-chain validators.
    pub fn cons_address(&self) -> Option<ConsAddress> {
        self.pub_key().map(ConsPubKey::address)
    }

    pub fn is_side_chain(&self) -> bool {
        matches!(self, ConsIdentity::SideChain { .. })
    }
}

/// Maximum field lengths of a [`Description`].
pub const MAX_MONIKER_LEN: usize = 70;
pub const MAX_IDENTITY_LEN: usize = 3000;
pub const MAX_WEBSITE_LEN: usize = 140;
pub const MAX_DETAILS_LEN: usize = 280;

/// Human-readable validator metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub details: String,
}

impl Description {
    pub fn new(moniker: impl Into<String>) -> Self {
        Self {
            moniker: moniker.into(),
            ..Default::default()
        }
    }

    /// Reject oversized fields.
    pub fn ensure_length(&self) -> Result<()> {
        let fields = [
            ("moniker", &self.moniker, MAX_MONIKER_LEN),
            ("identity", &self.identity, MAX_IDENTITY_LEN),
            ("website", &self.website, MAX_WEBSITE_LEN),
            ("details", &self.details, MAX_DETAILS_LEN),
        ];
        for (name, value, max) in fields {
            if value.len() > max {
                return Err(Error::invalid_description(format!(
                    "{name} is {} bytes, max {max}",
                    value.len()
                )));
            }
        }
        Ok(())
    }
}

/// A validator record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: ValAddress,
    pub cons_identity: ConsIdentity,
    pub jailed: bool,
    pub status: BondStatus,
    pub tokens: Dec,
    pub delegator_shares: Dec,
    pub description: Description,
    /// Height at which the validator last became bonded.
    pub bond_height: u64,
    /// Tie-break among validators of equal power and bond height.
    pub bond_intra_tx_counter: u32,
    /// Height at which the validator last began unbonding.
    pub unbonding_height: u64,
    /// Earliest block time at which unbonding completes.
    pub unbonding_min_time: DateTime<Utc>,
    pub commission: Commission,
}

impl Validator {
    /// A fresh, unbonded validator with no stake.
    pub fn new(
        operator: ValAddress,
        cons_identity: ConsIdentity,
        description: Description,
        commission: Commission,
    ) -> Self {
        Self {
            operator,
            cons_identity,
            jailed: false,
            status: BondStatus::Unbonded,
            tokens: Dec::ZERO,
            delegator_shares: Dec::ZERO,
            description,
            bond_height: 0,
            bond_intra_tx_counter: 0,
            unbonding_height: 0,
            unbonding_min_time: DateTime::<Utc>::default(),
            commission,
        }
    }

    pub fn is_bonded(&self) -> bool {
        self.status == BondStatus::Bonded
    }

    pub fn is_unbonding(&self) -> bool {
        self.status == BondStatus::Unbonding
    }

    pub fn is_unbonded(&self) -> bool {
        self.status == BondStatus::Unbonded
    }

    pub fn is_side_chain(&self) -> bool {
        self.cons_identity.is_side_chain()
    }

    /// Tokens that currently count toward consensus power.
    pub fn bonded_tokens(&self) -> Dec {
        if self.is_bonded() {
            self.tokens
        } else {
            Dec::ZERO
        }
    }

    /// Voting power reported to consensus: the raw bonded token amount.
    pub fn power(&self) -> i64 {
        self.bonded_tokens().raw()
    }

    /// Power the validator would have if bonded; this is what ranks it.
    pub fn potential_power(&self) -> i64 {
        self.tokens.raw()
    }

    /// Tokens per delegator share. One for a validator without shares.
    pub fn delegator_share_ex_rate(&self) -> Dec {
        if self.delegator_shares.is_zero() {
            Dec::ONE
        } else {
            self.tokens.quo(self.delegator_shares)
        }
    }

    /// Consensus update carrying the current power, if this validator is
    /// reported to consensus at all.
    pub fn abci_update(&self) -> Option<ValidatorUpdate> {
        self.cons_identity
            .pub_key()
            .map(|key| ValidatorUpdate::new(*key, self.power()))
    }

    /// Consensus update removing this validator.
    pub fn abci_update_zero(&self) -> Option<ValidatorUpdate> {
        self.cons_identity
            .pub_key()
            .map(|key| ValidatorUpdate::new(*key, 0))
    }

    /// Add delegated tokens, returning the shares issued for them.
    pub fn add_tokens_from_del(mut self, mut pool: Pool, amount: Dec) -> (Self, Pool, Dec) {
        self.check_amount("add_tokens_from_del", amount);
        let ex_rate = self.delegator_share_ex_rate();

        pool = pool.add_tokens(amount, self.is_bonded());
        self.tokens = self.tokens.add(amount);
        let issued_shares = amount.quo(ex_rate);
        self.delegator_shares = self.delegator_shares.add(issued_shares);

        (self, pool, issued_shares)
    }

    /// Remove delegator shares, returning the tokens released for them.
    ///
    /// Removing the last shares releases every remaining token so that no
    /// rounding dust is left behind on a validator nobody owns.
    pub fn remove_del_shares(mut self, mut pool: Pool, shares: Dec) -> (Self, Pool, Dec) {
        self.check_amount("remove_del_shares", shares);
        if shares > self.delegator_shares {
            violated(InvariantViolation::new(
                "validator_shares",
                format!(
                    "removing {shares} shares from {} holding {}",
                    self.operator, self.delegator_shares
                ),
            ));
        }

        let remaining_shares = self.delegator_shares.sub(shares);
        let issued_tokens = if remaining_shares.is_zero() {
            self.tokens
        } else {
            let tokens = self.delegator_share_ex_rate().mul(shares);
            if tokens > self.tokens {
                self.tokens
            } else {
                tokens
            }
        };

        self.tokens = self.tokens.sub(issued_tokens);
        self.delegator_shares = remaining_shares;
        pool = pool.remove_tokens(issued_tokens, self.is_bonded());

        (self, pool, issued_tokens)
    }

    /// Remove tokens without touching shares (slashing).
    pub fn remove_tokens(mut self, mut pool: Pool, tokens: Dec) -> (Self, Pool) {
        self.check_amount("remove_tokens", tokens);
        if tokens > self.tokens {
            violated(InvariantViolation::new(
                "validator_tokens",
                format!(
                    "removing {tokens} tokens from {} holding {}",
                    self.operator, self.tokens
                ),
            ));
        }

        pool = pool.remove_tokens(tokens, self.is_bonded());
        self.tokens = self.tokens.sub(tokens);

        (self, pool)
    }

    /// Change status and move the validator's tokens between pool buckets.
    pub fn update_status(mut self, mut pool: Pool, new_status: BondStatus) -> (Self, Pool) {
        match (self.status, new_status) {
            (old, new) if old == new => return (self, pool),
            (BondStatus::Bonded, _) => pool = pool.bonded_to_loose(self.tokens),
            (_, BondStatus::Bonded) => pool = pool.loose_to_bonded(self.tokens),
            _ => {}
        }
        self.status = new_status;
        (self, pool)
    }

    fn check_amount(&self, op: &str, amount: Dec) {
        if amount.is_negative() {
            violated(InvariantViolation::new(
                "validator_amount",
                format!("{op} with negative amount {amount} on {}", self.operator),
            ));
        }
    }
}
