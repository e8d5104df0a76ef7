//! Per-block execution context.
//!
//! Height and time come only from the block header handed in by the
//! consensus engine. Nothing in the engine reads a local clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::ConsAddress;

/// The parts of a block header the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockHeader {
    pub fn new(chain_id: impl Into<String>, height: u64, time: DateTime<Utc>) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            time,
        }
    }
}

/// Which pass of the application is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Mempool admission; state changes are thrown away.
    Check,
    /// Block execution; state changes are committed.
    Deliver,
}

/// Context passed to every state-changing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub header: BlockHeader,
    pub mode: RunMode,
    /// Whether the current call originates from a transaction rather than
    /// begin/end block processing.
    pub in_tx: bool,
}

impl BlockContext {
    /// A deliver-mode context outside any transaction.
    pub fn new(header: BlockHeader) -> Self {
        Self {
            header,
            mode: RunMode::Deliver,
            in_tx: false,
        }
    }

    /// Same block, inside a transaction.
    pub fn with_tx(&self) -> Self {
        Self {
            in_tx: true,
            ..self.clone()
        }
    }

    /// Same block, in check mode.
    pub fn with_mode(&self, mode: RunMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.header.time
    }

    pub fn is_deliver(&self) -> bool {
        self.mode == RunMode::Deliver
    }
}

/// A validator's participation in the previous block's commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInfo {
    pub cons_addr: ConsAddress,
    pub power: i64,
    pub signed_last_block: bool,
}

/// Signers of the previous block, forwarded to collaborators at begin block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastCommitInfo {
    pub round: i32,
    pub votes: Vec<VoteInfo>,
}
