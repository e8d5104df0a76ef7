//! Validator commission and its validation rules.
//!
//! Commission errors are ordinary values returned to the transaction layer.
//! A rejected update leaves the validator untouched.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dec::Dec;
use crate::error::ErrorCode;

/// Minimum time between two commission rate changes.
pub fn min_update_interval() -> Duration {
    Duration::hours(24)
}

/// Rejected commission or commission update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommissionError {
    #[error("commission must not be negative")]
    Negative,

    #[error("commission cannot be more than 100%")]
    Huge,

    #[error("commission cannot be more than the max rate {max_rate}")]
    AboveMaxRate { max_rate: Dec },

    #[error("commission change rate must not be negative")]
    ChangeRateNegative,

    #[error("commission change rate cannot be more than the max rate")]
    ChangeRateAboveMaxRate,

    #[error("commission cannot be changed more than once in 24h")]
    UpdateTooSoon { last_update: DateTime<Utc> },

    #[error("commission cannot be changed by more than {max_change_rate} at once")]
    ChangeTooLarge { max_change_rate: Dec },
}

impl CommissionError {
    /// Transaction-layer error code.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidCommission
    }
}

/// Commission charged by a validator on delegator rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    /// Current rate.
    pub rate: Dec,
    /// Upper bound the rate can ever reach.
    pub max_rate: Dec,
    /// Largest change allowed in one update.
    pub max_change_rate: Dec,
    /// Block time of the last rate change.
    pub update_time: DateTime<Utc>,
}

impl Commission {
    pub fn new(rate: Dec, max_rate: Dec, max_change_rate: Dec, update_time: DateTime<Utc>) -> Self {
        Self {
            rate,
            max_rate,
            max_change_rate,
            update_time,
        }
    }

    /// Zero commission with zero bounds, set at `update_time`.
    pub fn zero(update_time: DateTime<Utc>) -> Self {
        Self::new(Dec::ZERO, Dec::ZERO, Dec::ZERO, update_time)
    }

    /// Validate the commission as a whole, used when a validator is created.
    pub fn validate(&self) -> Result<(), CommissionError> {
        if self.max_rate.is_negative() {
            return Err(CommissionError::Negative);
        }
        if self.max_rate > Dec::ONE {
            return Err(CommissionError::Huge);
        }
        if self.rate.is_negative() {
            return Err(CommissionError::Negative);
        }
        if self.rate > self.max_rate {
            return Err(CommissionError::AboveMaxRate {
                max_rate: self.max_rate,
            });
        }
        if self.max_change_rate.is_negative() {
            return Err(CommissionError::ChangeRateNegative);
        }
        if self.max_change_rate > self.max_rate {
            return Err(CommissionError::ChangeRateAboveMaxRate);
        }
        Ok(())
    }

    /// Validate a rate change requested at `block_time`.
    pub fn validate_new_rate(
        &self,
        new_rate: Dec,
        block_time: DateTime<Utc>,
    ) -> Result<(), CommissionError> {
        if block_time.signed_duration_since(self.update_time) < min_update_interval() {
            return Err(CommissionError::UpdateTooSoon {
                last_update: self.update_time,
            });
        }
        if new_rate.is_negative() {
            return Err(CommissionError::Negative);
        }
        if new_rate > self.max_rate {
            return Err(CommissionError::AboveMaxRate {
                max_rate: self.max_rate,
            });
        }
        if new_rate.sub(self.rate).abs() > self.max_change_rate {
            return Err(CommissionError::ChangeTooLarge {
                max_change_rate: self.max_change_rate,
            });
        }
        Ok(())
    }
}
