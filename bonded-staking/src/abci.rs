//! Begin/end block entry points.

use serde::{Deserialize, Serialize};
use tracing::debug;

use bonded_core::{BlockContext, LastCommitInfo, ValAddress, Validator, ValidatorUpdate};
use bonded_storage::{BatchWriter, KvStore};

use crate::error::Result;
use crate::keeper::Keeper;

/// Result of end-of-block processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndBlockResponse {
    /// Power changes for the consensus engine, in application order.
    pub validator_updates: Vec<ValidatorUpdate>,
    /// The bonded set after this block, highest power first.
    pub bonded: Vec<Validator>,
}

impl<S: KvStore + BatchWriter> Keeper<S> {
    /// Start a block: reset the intra-tx counter and complete matured
    /// unbondings. The last-commit signers are for collaborators such as
    /// slashing; the keeper itself only logs them.
    pub fn begin_block(
        &mut self,
        ctx: &BlockContext,
        last_commit: &LastCommitInfo,
    ) -> Result<Vec<ValAddress>> {
        debug!(
            height = ctx.height(),
            votes = last_commit.votes.len(),
            "Begin block"
        );
        self.set_intra_tx_counter(0)?;
        self.drain_matured(ctx)
    }

    /// Finish a block: reconcile the bonded set.
    pub fn end_block(&mut self, ctx: &BlockContext) -> Result<EndBlockResponse> {
        let (bonded, validator_updates) = self.apply_and_return_validator_set_updates(ctx)?;
        Ok(EndBlockResponse {
            validator_updates,
            bonded,
        })
    }
}
