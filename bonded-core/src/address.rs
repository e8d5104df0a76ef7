//! Addresses and consensus keys.
//!
//! All addresses are fixed 20-byte values so that keys built from them have
//! a fixed width and order lexicographically.
//!
//! - [`ValAddress`] - validator operator identity (primary key)
//! - [`ConsAddress`] - address of a consensus public key
//! - [`AccAddress`] - account address of a delegator
//! - [`ConsPubKey`] - Ed25519 consensus public key reported to consensus

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Length in bytes of every address type.
pub const ADDR_LEN: usize = 20;

/// Length in bytes of a consensus public key.
pub const CONS_PUBKEY_LEN: usize = 32;

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name([u8; ADDR_LEN]);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; ADDR_LEN]) -> Self {
                Self(bytes)
            }

            /// Create from a byte slice, which must be exactly 20 bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                let arr: [u8; ADDR_LEN] = bytes.try_into().map_err(|_| {
                    Error::invalid_address(format!(
                        "{}: expected {} bytes, got {}",
                        $label,
                        ADDR_LEN,
                        bytes.len()
                    ))
                })?;
                Ok(Self(arr))
            }

            /// Get the raw bytes.
            pub fn as_bytes(&self) -> &[u8; ADDR_LEN] {
                &self.0
            }

            /// Create from hex string.
            pub fn from_hex(s: &str) -> Result<Self> {
                let bytes = hex::decode(s)?;
                Self::from_slice(&bytes)
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

address_type!(
    /// Stable identity of a validator, independent of its consensus key.
    ValAddress,
    "validator address"
);

address_type!(
    /// Address derived from a consensus public key.
    ConsAddress,
    "consensus address"
);

address_type!(
    /// Account address of a delegator.
    AccAddress,
    "account address"
);

/// An Ed25519 consensus public key, as reported to the consensus engine.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsPubKey([u8; CONS_PUBKEY_LEN]);

impl ConsPubKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; CONS_PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; CONS_PUBKEY_LEN] {
        &self.0
    }

    /// Create from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        let arr: [u8; CONS_PUBKEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            Error::invalid_address(format!(
                "consensus key: expected {} bytes, got {}",
                CONS_PUBKEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Derive the consensus address: the first 20 bytes of SHA-256(key).
    pub fn address(&self) -> ConsAddress {
        let digest = Sha256::digest(self.0);
        let mut addr = [0u8; ADDR_LEN];
        addr.copy_from_slice(&digest[..ADDR_LEN]);
        ConsAddress(addr)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ConsPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsPubKey({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ConsPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
