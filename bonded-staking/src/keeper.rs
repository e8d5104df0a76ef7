//! The staking keeper.
//!
//! [`Keeper`] owns the per-block write cache over the backend store, the
//! hook subscribers and the event buffer. Its operations are spread over
//! several modules by concern:
//!
//! - [`crate::store`] - validator records and indices
//! - [`crate::queue`] - the unbonding queue
//! - [`crate::transitions`] - status transitions and jailing
//! - [`crate::updates`] - the end-of-block validator set reconciliation
//! - [`crate::history`] - validator sets recorded by height
//! - [`crate::abci`] - begin/end block entry points

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use bonded_core::{violated, BlockContext, Error, InvariantViolation, Params, Pool};
use bonded_storage::{BatchWriter, CacheStore, Keyspace, KvStore};

use crate::config::StakingConfig;
use crate::error::Result;
use crate::events::StakeEvent;
use crate::hooks::HookSet;
use crate::keys::meta;

/// Validator-set lifecycle engine over a backend store `S`.
#[derive(Debug)]
pub struct Keeper<S> {
    pub(crate) store: CacheStore<S>,
    pub(crate) hooks: HookSet,
    pub(crate) config: StakingConfig,
    events: Vec<StakeEvent>,
}

impl<S: KvStore + BatchWriter> Keeper<S> {
    /// Open a keeper over `backend`.
    ///
    /// A backend without stored parameters is initialized with the
    /// configured genesis parameters and pool.
    pub fn new(backend: S, hooks: HookSet, config: StakingConfig) -> Result<Self> {
        config.genesis_params.validate()?;

        let mut keeper = Self {
            store: CacheStore::new(backend),
            hooks,
            config,
            events: Vec::new(),
        };

        if !keeper.store.has(Keyspace::Meta, meta::PARAMS)? {
            let params = keeper.config.genesis_params.clone();
            keeper.set_params(&params)?;
            keeper.set_pool(keeper.config.genesis_pool)?;
            keeper.commit()?;
            info!(
                chain_id = %keeper.config.chain_id,
                max_validators = params.max_validators,
                "Initialized staking store"
            );
        }

        Ok(keeper)
    }

    /// The per-block cache over the backend.
    pub fn store(&self) -> &CacheStore<S> {
        &self.store
    }

    /// Registered hook subscribers, for collaborators that fire
    /// delegation hooks.
    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    // ========================================================================
    // Singletons
    // ========================================================================

    /// Current staking parameters.
    pub fn params(&self) -> Result<Params> {
        self.read(Keyspace::Meta, meta::PARAMS)?
            .ok_or_else(|| Error::corruption("staking params missing").into())
    }

    /// Replace the staking parameters.
    pub fn set_params(&self, params: &Params) -> Result<()> {
        params.validate()?;
        self.write(Keyspace::Meta, meta::PARAMS, params)
    }

    /// Current token pool.
    pub fn pool(&self) -> Result<Pool> {
        Ok(self.read(Keyspace::Meta, meta::POOL)?.unwrap_or_default())
    }

    pub fn set_pool(&self, pool: Pool) -> Result<()> {
        self.write(Keyspace::Meta, meta::POOL, &pool)
    }

    /// Total power of the bonded set as last reported to consensus.
    pub fn get_last_total_power(&self) -> Result<i64> {
        Ok(self
            .read(Keyspace::Meta, meta::LAST_TOTAL_POWER)?
            .unwrap_or(0))
    }

    pub(crate) fn set_last_total_power(&self, power: i64) -> Result<()> {
        self.write(Keyspace::Meta, meta::LAST_TOTAL_POWER, &power)
    }

    /// Next intra-tx counter value to hand out in this block.
    pub fn intra_tx_counter(&self) -> Result<u32> {
        Ok(self
            .read(Keyspace::Meta, meta::INTRA_TX_COUNTER)?
            .unwrap_or(0))
    }

    pub(crate) fn set_intra_tx_counter(&self, counter: u32) -> Result<()> {
        self.write(Keyspace::Meta, meta::INTRA_TX_COUNTER, &counter)
    }

    /// Hand out the current counter value and advance it.
    pub(crate) fn next_intra_tx_counter(&self) -> Result<u32> {
        let counter = self.intra_tx_counter()?;
        let Some(next) = counter.checked_add(1) else {
            violated(InvariantViolation::new(
                "intra_tx_counter",
                "counter exhausted within one block",
            ));
        };
        self.set_intra_tx_counter(next)?;
        Ok(counter)
    }

    // ========================================================================
    // Block commit
    // ========================================================================

    /// Persist every write of the current block in one atomic batch.
    pub fn commit(&mut self) -> Result<usize> {
        let ops = self.store.write()?;
        debug!(ops, events = self.events.len(), "Committed staking state");
        Ok(ops)
    }

    /// Drop every write and event of the current block.
    pub fn discard(&mut self) {
        self.store.discard();
        self.events.clear();
    }

    /// Drain the events recorded so far.
    pub fn take_events(&mut self) -> Vec<StakeEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn record_event(&mut self, ctx: &BlockContext, event: impl FnOnce(bool) -> StakeEvent) {
        if self.config.publish_events && ctx.is_deliver() {
            self.events.push(event(ctx.in_tx));
        }
    }

    // ========================================================================
    // Codec helpers
    // ========================================================================

    pub(crate) fn read<T: DeserializeOwned>(&self, ks: Keyspace, key: &[u8]) -> Result<Option<T>> {
        match self.store.get(ks, key)? {
            Some(bytes) => Ok(Some(decode(ks, &bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn write<T: Serialize>(&self, ks: Keyspace, key: &[u8], value: &T) -> Result<()> {
        let bytes = bincode::serialize(value).map_err(Error::from)?;
        self.store.put(ks, key, &bytes)?;
        Ok(())
    }
}

/// Decode a stored value; undecodable bytes mean the store is corrupt.
pub(crate) fn decode<T: DeserializeOwned>(ks: Keyspace, bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| Error::corruption(format!("undecodable value in {ks}: {e}")).into())
}
