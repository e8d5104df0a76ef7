//! Staking parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default unbonding period: three weeks.
pub const DEFAULT_UNBONDING_TIME: Duration = Duration::from_secs(60 * 60 * 24 * 21);

/// Default cap on the bonded set.
pub const DEFAULT_MAX_VALIDATORS: u16 = 100;

/// Chain parameters governing the validator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Time a validator spends Unbonding before it becomes Unbonded.
    pub unbonding_time: Duration,
    /// Maximum number of bonded validators.
    pub max_validators: u16,
    /// Denomination of the bonded token.
    pub bond_denom: String,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            unbonding_time: DEFAULT_UNBONDING_TIME,
            max_validators: DEFAULT_MAX_VALIDATORS,
            bond_denom: "stake".into(),
        }
    }
}

impl Params {
    /// Parse parameters from JSON, e.g. a genesis file section.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Check that the parameters are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_validators == 0 {
            return Err(Error::invalid_params("max_validators must be positive"));
        }
        if self.unbonding_time.is_zero() {
            return Err(Error::invalid_params("unbonding_time must be positive"));
        }
        self.unbonding_period()?;
        if self.bond_denom.is_empty() {
            return Err(Error::invalid_params("bond_denom must not be empty"));
        }
        Ok(())
    }

    /// The unbonding time as a block-time offset.
    pub fn unbonding_period(&self) -> Result<chrono::Duration> {
        chrono::Duration::from_std(self.unbonding_time).map_err(|e| {
            Error::invalid_params(format!(
                "unbonding_time {:?} out of range: {e}",
                self.unbonding_time
            ))
        })
    }
}
