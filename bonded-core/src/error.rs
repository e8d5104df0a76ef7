//! Error types for the bonded engine.
//!
//! Provides structured errors with:
//! - Unique error codes for transaction results
//! - Source error chaining
//! - Client vs server error categorization
//!
//! Invariant violations are deliberately NOT part of this type. They abort
//! block processing, see [`crate::invariant`].

use std::io;
use thiserror::Error;

/// Result type for bonded operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes reported back to the transaction layer.
///
/// Codes are structured as:
/// - 1xxx: Validation errors (client)
/// - 2xxx: Not found errors (client)
/// - 3xxx: Conflict errors (client)
/// - 5xxx: Storage errors (server)
/// - 6xxx: Internal errors (server)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidAddress = 1001,
    InvalidCommission = 1002,
    InvalidParams = 1003,
    InvalidAmount = 1004,
    InvalidChannel = 1005,
    InvalidDescription = 1006,

    // Not found errors (2xxx)
    ValidatorNotFound = 2001,
    ChannelNotFound = 2002,

    // Conflict errors (3xxx)
    ValidatorExists = 3001,
    ConsensusAddressInUse = 3002,
    DuplicateChannel = 3003,

    // Storage errors (5xxx)
    StorageRead = 5001,
    StorageWrite = 5002,
    StorageCorruption = 5003,
    StorageInit = 5004,

    // Internal errors (6xxx)
    Serialization = 6001,
    Deserialization = 6002,
    Internal = 6003,
}

impl ErrorCode {
    /// Get the numeric code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Check if this is a client error (the transaction is rejected).
    pub fn is_client_error(self) -> bool {
        (1000..5000).contains(&self.code())
    }

    /// Check if this is a server error (the node itself is unhealthy).
    pub fn is_server_error(self) -> bool {
        self.code() >= 5000
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Errors that can occur in the bonded engine.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Validation Errors (client errors)
    // ========================================================================
    /// Malformed address or key bytes.
    #[error("[{code}] invalid address: {message}")]
    InvalidAddress {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Any other rejected input.
    #[error("[{code}] invalid input: {message}")]
    Invalid { code: ErrorCode, message: String },

    // ========================================================================
    // Not Found Errors (client errors)
    // ========================================================================
    /// Item not found.
    #[error("[{code}] not found: {message}")]
    NotFound { code: ErrorCode, message: String },

    // ========================================================================
    // Conflict Errors (client errors)
    // ========================================================================
    /// Duplicate item.
    #[error("[{code}] duplicate: {message}")]
    Duplicate { code: ErrorCode, message: String },

    // ========================================================================
    // Storage Errors (server errors)
    // ========================================================================
    /// Storage operation failed.
    #[error("[{code}] storage error: {message}")]
    Storage {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ========================================================================
    // Serialization Errors (server errors)
    // ========================================================================
    /// Serialization/deserialization failed.
    #[error("[{code}] serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ========================================================================
    // Internal Errors (server errors)
    // ========================================================================
    /// Internal error.
    #[error("[{code}] internal error: {message}")]
    Internal { code: ErrorCode, message: String },
}

impl Error {
    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidAddress { code, .. } => *code,
            Error::Invalid { code, .. } => *code,
            Error::NotFound { code, .. } => *code,
            Error::Duplicate { code, .. } => *code,
            Error::Storage { code, .. } => *code,
            Error::Serialization { code, .. } => *code,
            Error::Internal { code, .. } => *code,
        }
    }

    /// Check if this is a client error.
    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        self.code().is_server_error()
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Error {
    /// Create an InvalidAddress error.
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Error::InvalidAddress {
            code: ErrorCode::InvalidAddress,
            message: message.into(),
            source: None,
        }
    }

    /// Create an error for rejected chain parameters.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Error::Invalid {
            code: ErrorCode::InvalidParams,
            message: message.into(),
        }
    }

    /// Create an error for a rejected token or share amount.
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Error::Invalid {
            code: ErrorCode::InvalidAmount,
            message: message.into(),
        }
    }

    /// Create an error for a rejected channel name or id.
    pub fn invalid_channel(message: impl Into<String>) -> Self {
        Error::Invalid {
            code: ErrorCode::InvalidChannel,
            message: message.into(),
        }
    }

    /// Create an error for an oversized description field.
    pub fn invalid_description(message: impl Into<String>) -> Self {
        Error::Invalid {
            code: ErrorCode::InvalidDescription,
            message: message.into(),
        }
    }

    /// Create a NotFound error for validators.
    pub fn validator_not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            code: ErrorCode::ValidatorNotFound,
            message: message.into(),
        }
    }

    /// Create a NotFound error for channels.
    pub fn channel_not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            code: ErrorCode::ChannelNotFound,
            message: message.into(),
        }
    }

    /// Create a Duplicate error with an explicit code.
    pub fn duplicate(code: ErrorCode, message: impl Into<String>) -> Self {
        Error::Duplicate {
            code,
            message: message.into(),
        }
    }

    /// Create a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            code: ErrorCode::StorageRead,
            message: message.into(),
            source: None,
        }
    }

    /// Create a Storage error for failed writes.
    pub fn storage_write(message: impl Into<String>) -> Self {
        Error::Storage {
            code: ErrorCode::StorageWrite,
            message: message.into(),
            source: None,
        }
    }

    /// Create a Storage error for undecodable stored bytes.
    pub fn corruption(message: impl Into<String>) -> Self {
        Error::Storage {
            code: ErrorCode::StorageCorruption,
            message: message.into(),
            source: None,
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization {
            code: ErrorCode::Serialization,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            code: ErrorCode::Deserialization,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Storage {
            code: ErrorCode::StorageRead,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidAddress {
            code: ErrorCode::InvalidAddress,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}
