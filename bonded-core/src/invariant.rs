//! Invariant violations.
//!
//! A violation means the engine or its caller has a bug. It is never caused
//! by user input, so it is never returned as an error: block processing is
//! aborted through [`violated`] instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Violation of a state-machine invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invariant '{name}' violated: {message}")]
pub struct InvariantViolation {
    /// Invariant name.
    pub name: String,
    /// Violation message.
    pub message: String,
    /// Block height at violation (if available).
    pub height: Option<u64>,
}

impl InvariantViolation {
    /// Create a new violation.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            height: None,
        }
    }

    /// Add block height context.
    pub fn at_height(mut self, height: u64) -> Self {
        self.height = Some(height);
        self
    }
}

/// Abort block processing with an invariant violation.
///
/// Logs the violation before panicking so the node's log carries the cause
/// even when the panic message is swallowed by the host.
#[track_caller]
pub fn violated(violation: InvariantViolation) -> ! {
    tracing::error!(
        invariant = %violation.name,
        height = ?violation.height,
        "{}",
        violation.message
    );
    panic!("{}", violation)
}
