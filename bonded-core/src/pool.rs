//! Chain-wide token pool.

use serde::{Deserialize, Serialize};

use crate::dec::Dec;
use crate::invariant::{violated, InvariantViolation};

/// Aggregate of bonded and not-bonded ("loose") tokens held by validators.
///
/// Every validator token movement is mirrored here in the same call:
/// delegations credit the pool, share removals and slashes debit it, and
/// status changes move tokens between the two buckets. After the
/// end-of-block reconciliation the bonded tokens equal the sum of the
/// tokens held by bonded validators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Tokens not backing any bonded validator.
    pub loose_tokens: Dec,
    /// Tokens backing bonded validators.
    pub bonded_tokens: Dec,
}

impl Pool {
    /// Create a pool holding `loose` tokens and nothing bonded.
    pub fn new(loose: Dec) -> Self {
        Self {
            loose_tokens: loose,
            bonded_tokens: Dec::ZERO,
        }
    }

    /// Total supply tracked by the pool.
    pub fn total_supply(&self) -> Dec {
        self.loose_tokens.add(self.bonded_tokens)
    }

    /// Fraction of the supply that is bonded.
    pub fn bonded_ratio(&self) -> Dec {
        let supply = self.total_supply();
        if supply.is_positive() {
            self.bonded_tokens.quo(supply)
        } else {
            Dec::ZERO
        }
    }

    /// Credit newly staked tokens to one bucket.
    pub fn add_tokens(mut self, amount: Dec, bonded: bool) -> Self {
        if bonded {
            self.bonded_tokens = self.bonded_tokens.add(amount);
        } else {
            self.loose_tokens = self.loose_tokens.add(amount);
        }
        self.check("add_tokens", amount)
    }

    /// Debit tokens leaving the stake from one bucket.
    pub fn remove_tokens(mut self, amount: Dec, bonded: bool) -> Self {
        if bonded {
            self.bonded_tokens = self.bonded_tokens.sub(amount);
        } else {
            self.loose_tokens = self.loose_tokens.sub(amount);
        }
        self.check("remove_tokens", amount)
    }

    /// Move tokens from loose to bonded.
    pub fn loose_to_bonded(mut self, amount: Dec) -> Self {
        self.loose_tokens = self.loose_tokens.sub(amount);
        self.bonded_tokens = self.bonded_tokens.add(amount);
        self.check("loose_to_bonded", amount)
    }

    /// Move tokens from bonded to loose.
    pub fn bonded_to_loose(mut self, amount: Dec) -> Self {
        self.bonded_tokens = self.bonded_tokens.sub(amount);
        self.loose_tokens = self.loose_tokens.add(amount);
        self.check("bonded_to_loose", amount)
    }

    fn check(self, op: &str, amount: Dec) -> Self {
        if self.loose_tokens.is_negative() || self.bonded_tokens.is_negative() {
            violated(InvariantViolation::new(
                "pool",
                format!(
                    "{op} of {amount} left negative balance (loose {}, bonded {})",
                    self.loose_tokens, self.bonded_tokens
                ),
            ));
        }
        self
    }
}
