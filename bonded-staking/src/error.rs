//! Errors returned by keeper operations.
//!
//! These are recoverable: the transaction that caused them is rejected and
//! the store is left as it was. Broken invariants never surface here; they
//! abort the block through [`bonded_core::violated`].

use bonded_core::{CommissionError, ErrorCode, ValAddress};

/// Result type for keeper operations.
pub type Result<T> = std::result::Result<T, StakingError>;

/// Errors specific to staking operations.
#[derive(Debug, thiserror::Error)]
pub enum StakingError {
    #[error("validator {0} already exists")]
    ValidatorExists(ValAddress),

    #[error("consensus address {0} is already used by another validator")]
    ConsensusAddressInUse(String),

    #[error("validator {0} not found")]
    ValidatorNotFound(ValAddress),

    #[error("no validator with consensus address {0}")]
    ConsensusAddressNotFound(String),

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(String),

    #[error("invalid commission: {0}")]
    Commission(#[from] CommissionError),

    #[error(transparent)]
    Core(#[from] bonded_core::Error),
}

impl StakingError {
    /// Transaction-layer error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            StakingError::ValidatorExists(_) => ErrorCode::ValidatorExists,
            StakingError::ConsensusAddressInUse(_) => ErrorCode::ConsensusAddressInUse,
            StakingError::ValidatorNotFound(_) | StakingError::ConsensusAddressNotFound(_) => {
                ErrorCode::ValidatorNotFound
            }
            StakingError::NonPositiveAmount(_) => ErrorCode::InvalidAmount,
            StakingError::Commission(e) => e.code(),
            StakingError::Core(e) => e.code(),
        }
    }
}
