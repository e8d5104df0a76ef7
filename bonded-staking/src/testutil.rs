//! Fixtures shared by the unit tests.

use chrono::{Duration, TimeZone, Utc};

use bonded_core::{
    BlockContext, BlockHeader, Commission, ConsIdentity, ConsPubKey, Dec, Description, Params,
    ValAddress, Validator,
};
use bonded_storage::{Direction, KeyRange, KvPair, Keyspace, KvStore, MemStorage};

use crate::config::StakingConfig;
use crate::hooks::HookSet;
use crate::keeper::Keeper;

pub fn setup(max_validators: u16) -> (Keeper<MemStorage>, BlockContext) {
    let params = Params {
        max_validators,
        ..Default::default()
    };
    let keeper = Keeper::new(
        MemStorage::new(),
        HookSet::new(),
        StakingConfig::with_params(params),
    )
    .unwrap();
    let header = BlockHeader::new("test", 1, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    (keeper, BlockContext::new(header))
}

pub fn next_block(ctx: &BlockContext, blocks: u64, elapsed: Duration) -> BlockContext {
    BlockContext::new(BlockHeader::new(
        ctx.header.chain_id.clone(),
        ctx.height() + blocks,
        ctx.time() + elapsed,
    ))
}

pub fn addr(n: u8) -> ValAddress {
    ValAddress::from_bytes([n; 20])
}

pub fn pub_key(n: u8) -> ConsPubKey {
    ConsPubKey::from_bytes([n; 32])
}

pub fn identity(n: u8) -> ConsIdentity {
    ConsIdentity::Main(pub_key(n))
}

pub fn description() -> Description {
    Description::new("validator")
}

pub fn commission() -> Commission {
    Commission::new(
        "0.10".parse().unwrap(),
        "0.20".parse().unwrap(),
        "0.05".parse().unwrap(),
        Default::default(),
    )
}

/// Create validator `n` without stake.
pub fn create(keeper: &mut Keeper<MemStorage>, ctx: &BlockContext, n: u8) -> Validator {
    keeper
        .create_validator(ctx, addr(n), identity(n), description(), commission())
        .unwrap()
}

/// Add `tokens` whole tokens to existing validator `n`.
pub fn delegate(keeper: &mut Keeper<MemStorage>, ctx: &BlockContext, n: u8, tokens: i64) -> Validator {
    keeper
        .add_validator_tokens_and_shares(ctx, &addr(n), Dec::from_int(tokens))
        .unwrap()
        .0
}

/// Create validator `n` and stake `tokens` whole tokens on it.
pub fn stake(keeper: &mut Keeper<MemStorage>, ctx: &BlockContext, n: u8, tokens: i64) -> Validator {
    create(keeper, ctx, n);
    delegate(keeper, ctx, n, tokens)
}

/// Operators in the power index, highest rank first.
pub fn power_index(keeper: &Keeper<MemStorage>) -> Vec<ValAddress> {
    keeper
        .store()
        .scan(Keyspace::ValidatorsByPower, &KeyRange::all(), Direction::Reverse, None)
        .unwrap()
        .into_iter()
        .map(|(_, value)| ValAddress::from_slice(&value).unwrap())
        .collect()
}

pub fn queue_entries(keeper: &Keeper<MemStorage>) -> Vec<KvPair> {
    keeper
        .store()
        .scan(Keyspace::ValidatorQueue, &KeyRange::all(), Direction::Forward, None)
        .unwrap()
}
