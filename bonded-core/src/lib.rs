//! Bonded Core - Fundamental types for the validator-set engine.
//!
//! This crate provides the data structures shared by storage and the
//! staking engine:
//!
//! - [`address`] - Operator, consensus and account addresses, consensus keys
//! - [`dec`] - Deterministic fixed-point decimal for tokens and rates
//! - [`validator`] - The validator record and its token/share arithmetic
//! - [`pool`] - Bonded vs loose token totals
//! - [`commission`] - Commission rates and their update rules
//! - [`params`] - Staking parameters
//! - [`context`] - Block header and execution mode
//! - [`channel`] - Cross-chain channel registry
//! - [`invariant`] - Fatal invariant violations
//!
//! # Example
//!
//! ```rust
//! use bonded_core::{
//!     Commission, ConsIdentity, ConsPubKey, Dec, Description, Pool, ValAddress, Validator,
//! };
//!
//! let validator = Validator::new(
//!     ValAddress::from_bytes([1; 20]),
//!     ConsIdentity::Main(ConsPubKey::from_bytes([2; 32])),
//!     Description::new("alpha"),
//!     Commission::zero(Default::default()),
//! );
//!
//! let pool = Pool::new(Dec::from_int(1_000));
//! let (validator, _pool, shares) = validator.add_tokens_from_del(pool, Dec::from_int(10));
//!
//! assert_eq!(shares, Dec::from_int(10));
//! assert_eq!(validator.potential_power(), Dec::from_int(10).raw());
//! ```

pub mod address;
pub mod channel;
pub mod commission;
pub mod context;
pub mod dec;
pub mod error;
pub mod invariant;
pub mod params;
pub mod pool;
pub mod update;
pub mod validator;

#[cfg(test)]
mod proptest;

// Re-exports for convenience
pub use address::{AccAddress, ConsAddress, ConsPubKey, ValAddress, ADDR_LEN};
pub use channel::{
    parse_cross_chain_id, ChannelId, ChannelRegistry, ChannelRegistryBuilder, CrossChainId,
};
pub use commission::{Commission, CommissionError};
pub use context::{BlockContext, BlockHeader, LastCommitInfo, RunMode, VoteInfo};
pub use dec::Dec;
pub use error::{Error, ErrorCode, Result};
pub use invariant::{violated, InvariantViolation};
pub use params::Params;
pub use pool::Pool;
pub use update::ValidatorUpdate;
pub use validator::{BondStatus, ConsIdentity, Description, Validator};
