//! Key encodings.
//!
//! All ordered keys are fixed-width big-endian so that byte order equals
//! the intended logical order.

use chrono::{DateTime, TimeZone, Utc};

use bonded_core::{Error, Result, ValAddress, Validator, ADDR_LEN};

/// Singleton keys in the meta keyspace.
pub mod meta {
    pub const POOL: &[u8] = b"pool";
    pub const PARAMS: &[u8] = b"params";
    pub const LAST_TOTAL_POWER: &[u8] = b"last_total_power";
    pub const INTRA_TX_COUNTER: &[u8] = b"intra_tx_counter";
}

/// Length of a power-index key.
pub const POWER_KEY_LEN: usize = 8 + 8 + 4 + ADDR_LEN;

/// Length of a queue key.
pub const QUEUE_KEY_LEN: usize = 8 + 4;

/// Power-index key of a validator.
///
/// Layout: `power | !bond_height | !intra_tx_counter | !operator`.
/// Scanning in descending byte order yields power descending, then bond
/// height, counter and operator address ascending.
pub fn power_key(validator: &Validator) -> Vec<u8> {
    let power = validator.potential_power().max(0) as u64;
    let mut key = Vec::with_capacity(POWER_KEY_LEN);
    key.extend_from_slice(&power.to_be_bytes());
    key.extend_from_slice(&(!validator.bond_height).to_be_bytes());
    key.extend_from_slice(&(!validator.bond_intra_tx_counter).to_be_bytes());
    key.extend(validator.operator.as_bytes().iter().map(|b| !b));
    key
}

/// Operator address encoded in a power-index key.
pub fn operator_from_power_key(key: &[u8]) -> Result<ValAddress> {
    if key.len() != POWER_KEY_LEN {
        return Err(Error::corruption(format!(
            "power key has {} bytes, expected {}",
            key.len(),
            POWER_KEY_LEN
        )));
    }
    let inverted: Vec<u8> = key[POWER_KEY_LEN - ADDR_LEN..].iter().map(|b| !b).collect();
    ValAddress::from_slice(&inverted)
}

/// Queue key for a maturity time: seconds with the sign bit flipped, then
/// nanoseconds, so that pre-epoch times sort first.
pub fn queue_key(time: DateTime<Utc>) -> Vec<u8> {
    let secs = (time.timestamp() as u64) ^ (1 << 63);
    let mut key = Vec::with_capacity(QUEUE_KEY_LEN);
    key.extend_from_slice(&secs.to_be_bytes());
    key.extend_from_slice(&time.timestamp_subsec_nanos().to_be_bytes());
    key
}

/// Maturity time encoded in a queue key.
pub fn time_from_queue_key(key: &[u8]) -> Result<DateTime<Utc>> {
    let bad = || Error::corruption(format!("invalid queue key {}", hex_key(key)));
    if key.len() != QUEUE_KEY_LEN {
        return Err(bad());
    }
    let secs = u64::from_be_bytes(key[..8].try_into().map_err(|_| bad())?) ^ (1 << 63);
    let nanos = u32::from_be_bytes(key[8..].try_into().map_err(|_| bad())?);
    Utc.timestamp_opt(secs as i64, nanos).single().ok_or_else(bad)
}

/// Key of a validator set recorded at `height`.
pub fn height_key(height: u64) -> Vec<u8> {
    height.to_be_bytes().to_vec()
}

/// Height encoded in a history key.
pub fn height_from_key(key: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = key
        .try_into()
        .map_err(|_| Error::corruption(format!("invalid height key {}", hex_key(key))))?;
    Ok(u64::from_be_bytes(arr))
}

fn hex_key(key: &[u8]) -> String {
    hex::encode(key)
}
