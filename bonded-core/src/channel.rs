//! Cross-chain channel registry.
//!
//! Maps channel names to one-byte channel ids. The registry is assembled
//! once at startup through [`ChannelRegistryBuilder`] and is read-only
//! afterwards; consumers receive it by reference.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorCode, Result};

/// Identifier of a chain participating in cross-chain messaging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CrossChainId(pub u16);

impl fmt::Display for CrossChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a registered channel. Zero is never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u8);

/// Parse a decimal cross-chain id in `[0, 65535]`.
pub fn parse_cross_chain_id(input: &str) -> Result<CrossChainId> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|e| Error::invalid_channel(format!("invalid cross chain id {input:?}: {e}")))?;
    u16::try_from(value)
        .map(CrossChainId)
        .map_err(|_| Error::invalid_channel("cross chain id must be in [0, 65535]"))
}

/// Builder for a [`ChannelRegistry`].
#[derive(Debug, Clone)]
pub struct ChannelRegistryBuilder {
    source_chain_id: CrossChainId,
    by_name: BTreeMap<String, ChannelId>,
    next_id: Option<u8>,
}

impl ChannelRegistryBuilder {
    pub fn new(source_chain_id: CrossChainId) -> Self {
        Self {
            source_chain_id,
            by_name: BTreeMap::new(),
            next_id: Some(1),
        }
    }

    /// Register a channel under the next free id.
    pub fn register(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_channel("channel name must not be empty"));
        }
        if self.by_name.contains_key(&name) {
            return Err(Error::duplicate(
                ErrorCode::DuplicateChannel,
                format!("channel {name:?} already registered"),
            ));
        }
        let id = self
            .next_id
            .ok_or_else(|| Error::invalid_channel("all 255 channel ids are in use"))?;
        self.by_name.insert(name, ChannelId(id));
        self.next_id = id.checked_add(1);
        Ok(self)
    }

    pub fn build(self) -> ChannelRegistry {
        let by_id = self
            .by_name
            .iter()
            .map(|(name, id)| (*id, name.clone()))
            .collect();
        ChannelRegistry {
            source_chain_id: self.source_chain_id,
            by_name: self.by_name,
            by_id,
        }
    }
}

/// Immutable name/id lookup table for cross-chain channels.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    source_chain_id: CrossChainId,
    by_name: BTreeMap<String, ChannelId>,
    by_id: BTreeMap<ChannelId, String>,
}

impl ChannelRegistry {
    pub fn builder(source_chain_id: CrossChainId) -> ChannelRegistryBuilder {
        ChannelRegistryBuilder::new(source_chain_id)
    }

    /// The id of this chain.
    pub fn source_chain_id(&self) -> CrossChainId {
        self.source_chain_id
    }

    pub fn channel_id(&self, name: &str) -> Result<ChannelId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::channel_not_found(format!("channel {name:?}")))
    }

    pub fn channel_name(&self, id: ChannelId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
