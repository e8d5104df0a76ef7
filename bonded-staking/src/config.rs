//! Keeper configuration.

use bonded_core::{Params, Pool};

/// Keeper configuration.
#[derive(Debug, Clone)]
pub struct StakingConfig {
    /// Chain identifier, for log context.
    pub chain_id: String,
    /// Parameters written to the store when it holds none yet.
    pub genesis_params: Params,
    /// Pool written to the store when it holds none yet.
    pub genesis_pool: Pool,
    /// Record validator update/removal events during block delivery.
    pub publish_events: bool,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            chain_id: "bonded-mainnet".into(),
            genesis_params: Params::default(),
            genesis_pool: Pool::default(),
            publish_events: false,
        }
    }
}

impl StakingConfig {
    /// Default configuration with the given parameters.
    pub fn with_params(params: Params) -> Self {
        Self {
            genesis_params: params,
            ..Default::default()
        }
    }
}
