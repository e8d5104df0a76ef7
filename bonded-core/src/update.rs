//! Records handed to the consensus engine at end of block.

use serde::{Deserialize, Serialize};

use crate::address::ConsPubKey;

/// A single validator-set delta entry. Power zero removes the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: ConsPubKey,
    pub power: i64,
}

impl ValidatorUpdate {
    pub fn new(pub_key: ConsPubKey, power: i64) -> Self {
        Self { pub_key, power }
    }

    /// Whether this entry removes the validator from the consensus set.
    pub fn is_removal(&self) -> bool {
        self.power == 0
    }
}
