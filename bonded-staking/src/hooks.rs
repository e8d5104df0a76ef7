//! Lifecycle hooks.
//!
//! Subsystems such as slashing and reward distribution subscribe to
//! validator lifecycle changes by implementing [`StakingHooks`]. The keeper
//! holds an explicit list of subscribers fixed at construction and notifies
//! them in registration order.
//!
//! Hooks are notifications: a failing hook is logged and the transition
//! that triggered it proceeds.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use bonded_core::{AccAddress, BlockContext, ConsIdentity, ValAddress};

/// Error reported by a hook subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl From<&str> for HookError {
    fn from(s: &str) -> Self {
        HookError(s.to_string())
    }
}

impl From<String> for HookError {
    fn from(s: String) -> Self {
        HookError(s)
    }
}

/// Result type for hook callbacks.
pub type HookResult = std::result::Result<(), HookError>;

/// Subscriber to validator and delegation lifecycle events.
///
/// Every method defaults to doing nothing.
pub trait StakingHooks: Send + Sync {
    fn on_validator_created(&self, _ctx: &BlockContext, _operator: &ValAddress) -> HookResult {
        Ok(())
    }

    fn on_validator_modified(&self, _ctx: &BlockContext, _operator: &ValAddress) -> HookResult {
        Ok(())
    }

    fn on_validator_removed(
        &self,
        _ctx: &BlockContext,
        _identity: &ConsIdentity,
        _operator: &ValAddress,
    ) -> HookResult {
        Ok(())
    }

    fn on_validator_bonded(
        &self,
        _ctx: &BlockContext,
        _identity: &ConsIdentity,
        _operator: &ValAddress,
    ) -> HookResult {
        Ok(())
    }

    fn on_validator_begin_unbonding(
        &self,
        _ctx: &BlockContext,
        _identity: &ConsIdentity,
        _operator: &ValAddress,
    ) -> HookResult {
        Ok(())
    }

    fn on_delegation_created(
        &self,
        _ctx: &BlockContext,
        _delegator: &AccAddress,
        _operator: &ValAddress,
    ) -> HookResult {
        Ok(())
    }

    fn on_delegation_shares_modified(
        &self,
        _ctx: &BlockContext,
        _delegator: &AccAddress,
        _operator: &ValAddress,
    ) -> HookResult {
        Ok(())
    }

    fn on_delegation_removed(
        &self,
        _ctx: &BlockContext,
        _delegator: &AccAddress,
        _operator: &ValAddress,
    ) -> HookResult {
        Ok(())
    }
}

/// Ordered list of hook subscribers.
#[derive(Clone, Default)]
pub struct HookSet {
    subscribers: Vec<Arc<dyn StakingHooks>>,
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Subscribers are notified in insertion order.
    pub fn with(mut self, hooks: Arc<dyn StakingHooks>) -> Self {
        self.subscribers.push(hooks);
        self
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    fn dispatch(&self, hook: &str, operator: &ValAddress, call: impl Fn(&dyn StakingHooks) -> HookResult) {
        for (index, subscriber) in self.subscribers.iter().enumerate() {
            if let Err(e) = call(subscriber.as_ref()) {
                warn!(hook, subscriber = index, %operator, error = %e, "Hook failed");
            }
        }
    }

    pub fn validator_created(&self, ctx: &BlockContext, operator: &ValAddress) {
        self.dispatch("on_validator_created", operator, |h| {
            h.on_validator_created(ctx, operator)
        });
    }

    pub fn validator_modified(&self, ctx: &BlockContext, operator: &ValAddress) {
        self.dispatch("on_validator_modified", operator, |h| {
            h.on_validator_modified(ctx, operator)
        });
    }

    pub fn validator_removed(&self, ctx: &BlockContext, identity: &ConsIdentity, operator: &ValAddress) {
        self.dispatch("on_validator_removed", operator, |h| {
            h.on_validator_removed(ctx, identity, operator)
        });
    }

    pub fn validator_bonded(&self, ctx: &BlockContext, identity: &ConsIdentity, operator: &ValAddress) {
        self.dispatch("on_validator_bonded", operator, |h| {
            h.on_validator_bonded(ctx, identity, operator)
        });
    }

    pub fn validator_begin_unbonding(
        &self,
        ctx: &BlockContext,
        identity: &ConsIdentity,
        operator: &ValAddress,
    ) {
        self.dispatch("on_validator_begin_unbonding", operator, |h| {
            h.on_validator_begin_unbonding(ctx, identity, operator)
        });
    }

    pub fn delegation_created(&self, ctx: &BlockContext, delegator: &AccAddress, operator: &ValAddress) {
        self.dispatch("on_delegation_created", operator, |h| {
            h.on_delegation_created(ctx, delegator, operator)
        });
    }

    pub fn delegation_shares_modified(
        &self,
        ctx: &BlockContext,
        delegator: &AccAddress,
        operator: &ValAddress,
    ) {
        self.dispatch("on_delegation_shares_modified", operator, |h| {
            h.on_delegation_shares_modified(ctx, delegator, operator)
        });
    }

    pub fn delegation_removed(&self, ctx: &BlockContext, delegator: &AccAddress, operator: &ValAddress) {
        self.dispatch("on_delegation_removed", operator, |h| {
            h.on_delegation_removed(ctx, delegator, operator)
        });
    }
}
