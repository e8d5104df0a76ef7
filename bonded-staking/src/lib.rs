//! Validator-set lifecycle engine.
//!
//! This crate keeps the validator store of a bonded proof-of-stake chain
//! and turns it into consensus power updates once per block:
//! - Validator records with consensus-address and power-rank indices
//! - Bonding state machine (Unbonded, Bonded, Unbonding) and jailing
//! - Unbonding queue keyed by maturity time
//! - End-of-block diff against the last reported bonded set
//! - Lifecycle hooks and buffered stake events
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │               begin_block / end_block                   │
//! │  (Counter reset, queue drain, validator set updates)    │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Keeper                            │
//! │  (Records, indices, transitions, hooks, events)         │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  CacheStore<S: KvStore>                 │
//! │  (Per-block write cache, committed as one batch)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use bonded_core::{BlockContext, BlockHeader, Commission, ConsIdentity, ConsPubKey, Dec};
//! use bonded_core::{Description, LastCommitInfo, ValAddress};
//! use bonded_staking::{HookSet, Keeper, StakingConfig};
//! use bonded_storage::MemStorage;
//! use chrono::Utc;
//!
//! let mut keeper = Keeper::new(MemStorage::new(), HookSet::new(), StakingConfig::default()).unwrap();
//! let ctx = BlockContext::new(BlockHeader::new("demo", 1, Utc::now()));
//!
//! let operator = ValAddress::from_bytes([1; 20]);
//! let identity = ConsIdentity::Main(ConsPubKey::from_bytes([9; 32]));
//! keeper
//!     .create_validator(&ctx, operator, identity, Description::new("alpha"), Commission::zero(ctx.time()))
//!     .unwrap();
//! keeper
//!     .add_validator_tokens_and_shares(&ctx, &operator, Dec::from_int(100))
//!     .unwrap();
//!
//! keeper.begin_block(&ctx, &LastCommitInfo::default()).unwrap();
//! let response = keeper.end_block(&ctx).unwrap();
//! assert_eq!(response.validator_updates.len(), 1);
//! keeper.commit().unwrap();
//! ```

mod abci;
mod config;
mod error;
mod events;
mod history;
mod hooks;
pub mod invariants;
mod keeper;
pub mod keys;
mod queue;
mod store;
mod transitions;
mod updates;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod testutil;

pub use abci::EndBlockResponse;
pub use config::StakingConfig;
pub use error::{Result, StakingError};
pub use events::StakeEvent;
pub use hooks::{HookError, HookResult, HookSet, StakingHooks};
pub use keeper::Keeper;
