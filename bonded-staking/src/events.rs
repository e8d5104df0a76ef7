//! Stake events for external subscribers.
//!
//! Unlike hooks, events are buffered: the keeper records them during block
//! delivery and the host drains them with [`crate::Keeper::take_events`]
//! after commit, e.g. to feed an indexer.

use serde::{Deserialize, Serialize};

use bonded_core::{ValAddress, Validator};

/// A change to the validator store observed during block delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeEvent {
    /// A validator record was written.
    ValidatorUpdated {
        validator: Box<Validator>,
        is_from_tx: bool,
    },
    /// A validator record was deleted.
    ValidatorRemoved {
        operator: ValAddress,
        side_chain_id: Option<String>,
        is_from_tx: bool,
    },
}

impl StakeEvent {
    /// Operator the event is about.
    pub fn operator(&self) -> &ValAddress {
        match self {
            StakeEvent::ValidatorUpdated { validator, .. } => &validator.operator,
            StakeEvent::ValidatorRemoved { operator, .. } => operator,
        }
    }

    /// Whether the change was caused by a transaction.
    pub fn is_from_tx(&self) -> bool {
        match self {
            StakeEvent::ValidatorUpdated { is_from_tx, .. }
            | StakeEvent::ValidatorRemoved { is_from_tx, .. } => *is_from_tx,
        }
    }
}
