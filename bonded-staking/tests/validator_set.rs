//! Block-level scenarios for the validator set engine.
//!
//! Each test drives the keeper through begin/end block the way a host
//! would and checks the consensus updates and store state that result.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use bonded_core::{
    BlockContext, BlockHeader, BondStatus, Commission, ConsIdentity, ConsPubKey, Dec,
    Description, LastCommitInfo, Params, RunMode, ValAddress, ValidatorUpdate,
};
use bonded_staking::{
    invariants, HookResult, HookSet, Keeper, StakeEvent, StakingConfig, StakingHooks,
};
use bonded_storage::{KvStore, Keyspace, MemStorage};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn genesis_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn block(height: u64, time: DateTime<Utc>) -> BlockContext {
    BlockContext::new(BlockHeader::new("scenario", height, time))
}

fn keeper_with(max_validators: u16, hooks: HookSet, publish_events: bool) -> Keeper<MemStorage> {
    init_tracing();
    let config = StakingConfig {
        publish_events,
        ..StakingConfig::with_params(Params {
            max_validators,
            ..Default::default()
        })
    };
    Keeper::new(MemStorage::new(), hooks, config).unwrap()
}

fn keeper(max_validators: u16) -> Keeper<MemStorage> {
    keeper_with(max_validators, HookSet::new(), false)
}

fn op(n: u8) -> ValAddress {
    ValAddress::from_bytes([n; 20])
}

fn key(n: u8) -> ConsPubKey {
    ConsPubKey::from_bytes([n; 32])
}

fn tokens(n: i64) -> Dec {
    Dec::from_int(n)
}

fn commission() -> Commission {
    Commission::new(
        "0.05".parse().unwrap(),
        "0.50".parse().unwrap(),
        "0.01".parse().unwrap(),
        genesis_time(),
    )
}

fn create(keeper: &mut Keeper<MemStorage>, ctx: &BlockContext, n: u8) {
    keeper
        .create_validator(
            ctx,
            op(n),
            ConsIdentity::Main(key(n)),
            Description::new(format!("validator-{n}")),
            commission(),
        )
        .unwrap();
}

fn stake(keeper: &mut Keeper<MemStorage>, ctx: &BlockContext, n: u8, amount: i64) {
    create(keeper, ctx, n);
    keeper
        .add_validator_tokens_and_shares(ctx, &op(n), tokens(amount))
        .unwrap();
}

fn run_block(keeper: &mut Keeper<MemStorage>, ctx: &BlockContext) -> Vec<ValidatorUpdate> {
    let response = keeper.end_block(ctx).unwrap();
    keeper.commit().unwrap();
    response.validator_updates
}

fn update(n: u8, power: i64) -> ValidatorUpdate {
    ValidatorUpdate::new(key(n), tokens(power).raw())
}

fn status(keeper: &Keeper<MemStorage>, n: u8) -> BondStatus {
    keeper.get_validator(&op(n)).unwrap().unwrap().status
}

fn assert_invariants(keeper: &Keeper<MemStorage>) {
    invariants::check_power_index(keeper).unwrap();
    invariants::check_bonded_pool(keeper).unwrap();
    invariants::check_last_validator_set(keeper).unwrap();
    invariants::check_unbonding_queue(keeper).unwrap();
}

// === Set selection ===

#[test]
fn top_two_of_three_are_bonded() {
    let mut keeper = keeper(2);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 100);
    stake(&mut keeper, &ctx, 2, 90);
    stake(&mut keeper, &ctx, 3, 80);

    let updates = run_block(&mut keeper, &ctx);
    assert_eq!(updates, vec![update(1, 100), update(2, 90)]);
    assert_eq!(status(&keeper, 3), BondStatus::Unbonded);
    assert_invariants(&keeper);

    // The third overtakes the second.
    let ctx = block(2, genesis_time() + Duration::seconds(5));
    keeper
        .add_validator_tokens_and_shares(&ctx, &op(3), tokens(15))
        .unwrap();
    let updates = run_block(&mut keeper, &ctx);
    assert_eq!(updates, vec![update(3, 95), update(2, 0)]);
    assert_eq!(status(&keeper, 2), BondStatus::Unbonding);
    assert_eq!(status(&keeper, 3), BondStatus::Bonded);
    assert_invariants(&keeper);
}

#[test]
fn shrinking_the_set_unbonds_the_weakest() {
    let mut keeper = keeper(3);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 100);
    stake(&mut keeper, &ctx, 2, 90);
    stake(&mut keeper, &ctx, 3, 80);
    assert_eq!(
        run_block(&mut keeper, &ctx),
        vec![update(1, 100), update(2, 90), update(3, 80)]
    );

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    let params = Params {
        max_validators: 2,
        ..keeper.params().unwrap()
    };
    keeper.set_params(&params).unwrap();

    assert_eq!(run_block(&mut keeper, &ctx), vec![update(3, 0)]);
    assert_eq!(status(&keeper, 1), BondStatus::Bonded);
    assert_eq!(status(&keeper, 2), BondStatus::Bonded);
    assert_eq!(status(&keeper, 3), BondStatus::Unbonding);
    assert_eq!(keeper.get_last_total_power().unwrap(), tokens(190).raw());
    assert_invariants(&keeper);
}

#[test]
fn equal_power_ranks_by_bond_height_then_counter() {
    let mut keeper = keeper(3);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 3, 10);
    stake(&mut keeper, &ctx, 2, 10);
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    keeper.begin_block(&ctx, &LastCommitInfo::default()).unwrap();
    stake(&mut keeper, &ctx, 1, 10);
    run_block(&mut keeper, &ctx);

    // 3 and 2 bonded at height 1 (3 delegated first); 1 bonded at height 2.
    let order: Vec<_> = keeper
        .get_bonded_validators_by_power()
        .unwrap()
        .iter()
        .map(|v| v.operator)
        .collect();
    assert_eq!(order, vec![op(3), op(2), op(1)]);
}

#[test]
fn update_list_never_repeats_a_key() {
    let mut keeper = keeper(3);
    let ctx = block(1, genesis_time());
    for n in 1..=5 {
        stake(&mut keeper, &ctx, n, 10 * n as i64);
    }
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    keeper
        .add_validator_tokens_and_shares(&ctx, &op(1), tokens(100))
        .unwrap();
    keeper.jail(&ctx, &ConsIdentity::Main(key(5)).index_key()).unwrap();
    let updates = run_block(&mut keeper, &ctx);

    let mut keys: Vec<_> = updates.iter().map(|u| u.pub_key).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), updates.len());
    assert_eq!(updates, vec![update(1, 110), update(5, 0)]);
}

#[test]
fn side_chain_validators_bond_without_updates() {
    let mut keeper = keeper(5);
    let ctx = block(1, genesis_time());
    keeper
        .create_validator(
            &ctx,
            op(7),
            ConsIdentity::SideChain {
                chain_id: "side-1".into(),
                cons_addr: vec![0x42; 20],
            },
            Description::new("side"),
            commission(),
        )
        .unwrap();
    keeper
        .add_validator_tokens_and_shares(&ctx, &op(7), tokens(50))
        .unwrap();
    stake(&mut keeper, &ctx, 1, 10);

    let response = keeper.end_block(&ctx).unwrap();
    assert_eq!(response.bonded.len(), 2);
    assert_eq!(response.validator_updates, vec![update(1, 10)]);
    assert_eq!(status(&keeper, 7), BondStatus::Bonded);
    assert_eq!(keeper.get_last_total_power().unwrap(), tokens(60).raw());
}

// === Unchanged power ===

#[test]
fn jail_and_unjail_in_one_block_emits_nothing() {
    let mut keeper = keeper(5);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 10);
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    let cons = ConsIdentity::Main(key(1)).index_key();
    keeper.jail(&ctx, &cons).unwrap();
    keeper.unjail(&ctx, &cons).unwrap();
    assert!(run_block(&mut keeper, &ctx).is_empty());
    assert_eq!(status(&keeper, 1), BondStatus::Bonded);
}

#[test]
fn restored_tokens_emit_nothing() {
    let mut keeper = keeper(5);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 40);
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    let (_, released) = keeper
        .remove_validator_tokens_and_shares(&ctx, &op(1), tokens(15))
        .unwrap();
    let (validator, _) = keeper
        .add_validator_tokens_and_shares(&ctx, &op(1), released)
        .unwrap();
    assert_eq!(validator.tokens, tokens(40));
    assert!(run_block(&mut keeper, &ctx).is_empty());
    assert_invariants(&keeper);
}

#[test]
fn rebonded_validator_is_reported_again() {
    let mut keeper = keeper(1);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 10);
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    stake(&mut keeper, &ctx, 2, 20);
    assert_eq!(run_block(&mut keeper, &ctx), vec![update(2, 20), update(1, 0)]);

    let ctx = block(3, genesis_time() + Duration::seconds(10));
    keeper
        .add_validator_tokens_and_shares(&ctx, &op(1), tokens(20))
        .unwrap();
    assert_eq!(run_block(&mut keeper, &ctx), vec![update(1, 30), update(2, 0)]);

    // Re-bonding took it out of the unbonding queue.
    assert_invariants(&keeper);
}

// === Jailing and unbonding ===

#[test]
fn jailed_validator_leaves_next_set() {
    let mut keeper = keeper(5);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 30);
    stake(&mut keeper, &ctx, 2, 20);
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    keeper.jail(&ctx, &ConsIdentity::Main(key(1)).index_key()).unwrap();
    let response = keeper.end_block(&ctx).unwrap();

    assert_eq!(response.validator_updates, vec![update(1, 0)]);
    assert_eq!(response.bonded.len(), 1);
    assert_eq!(response.bonded[0].operator, op(2));
    let jailed = keeper.get_validator(&op(1)).unwrap().unwrap();
    assert!(jailed.jailed);
    assert_eq!(jailed.status, BondStatus::Unbonding);
    assert_invariants(&keeper);
}

#[test]
fn unbonding_matures_exactly_at_unbonding_time() {
    let mut keeper = keeper(5);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 30);
    run_block(&mut keeper, &ctx);

    let jailed_at = genesis_time() + Duration::seconds(5);
    let ctx = block(2, jailed_at);
    keeper.jail(&ctx, &ConsIdentity::Main(key(1)).index_key()).unwrap();
    run_block(&mut keeper, &ctx);

    let period = keeper.params().unwrap().unbonding_period().unwrap();
    let matures_at = jailed_at + period;
    assert_eq!(
        keeper.get_validator(&op(1)).unwrap().unwrap().unbonding_min_time,
        matures_at
    );

    let early = block(100, matures_at - Duration::nanoseconds(1));
    let done = keeper.begin_block(&early, &LastCommitInfo::default()).unwrap();
    assert!(done.is_empty());
    assert_eq!(status(&keeper, 1), BondStatus::Unbonding);

    let due = block(101, matures_at);
    let done = keeper.begin_block(&due, &LastCommitInfo::default()).unwrap();
    assert_eq!(done, vec![op(1)]);
    assert_eq!(status(&keeper, 1), BondStatus::Unbonded);
    let pool = keeper.pool().unwrap();
    assert_eq!(pool.loose_tokens, tokens(30));
    assert!(pool.bonded_tokens.is_zero());

    // Draining again finds nothing.
    let again = block(102, matures_at + Duration::seconds(1));
    assert!(keeper
        .begin_block(&again, &LastCommitInfo::default())
        .unwrap()
        .is_empty());
    assert_eq!(status(&keeper, 1), BondStatus::Unbonded);
    assert_invariants(&keeper);
}

#[test]
fn emptied_validator_is_removed() {
    let mut keeper = keeper(5);
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 30);
    stake(&mut keeper, &ctx, 2, 20);
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    keeper
        .remove_validator_tokens_and_shares(&ctx, &op(1), tokens(30))
        .unwrap();
    assert_eq!(run_block(&mut keeper, &ctx), vec![update(1, 0)]);

    assert!(keeper.get_validator(&op(1)).unwrap().is_none());
    assert!(keeper
        .get_validator_by_cons_addr(&ConsIdentity::Main(key(1)).index_key())
        .unwrap()
        .is_none());
    assert_invariants(&keeper);
}

// === Hooks and events ===

#[derive(Default)]
struct Journal {
    entries: Mutex<Vec<String>>,
}

impl Journal {
    fn push(&self, entry: String) -> HookResult {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

impl StakingHooks for Journal {
    fn on_validator_created(&self, _ctx: &BlockContext, operator: &ValAddress) -> HookResult {
        self.push(format!("created {}", operator.as_bytes()[0]))
    }

    fn on_validator_bonded(
        &self,
        _ctx: &BlockContext,
        _identity: &ConsIdentity,
        operator: &ValAddress,
    ) -> HookResult {
        self.push(format!("bonded {}", operator.as_bytes()[0]))
    }

    fn on_validator_begin_unbonding(
        &self,
        _ctx: &BlockContext,
        _identity: &ConsIdentity,
        operator: &ValAddress,
    ) -> HookResult {
        self.push(format!("unbonding {}", operator.as_bytes()[0]))
    }

    fn on_validator_removed(
        &self,
        _ctx: &BlockContext,
        _identity: &ConsIdentity,
        operator: &ValAddress,
    ) -> HookResult {
        self.push(format!("removed {}", operator.as_bytes()[0]))
    }
}

#[test]
fn hooks_follow_the_lifecycle() {
    let journal = Arc::new(Journal::default());
    let mut keeper = keeper_with(5, HookSet::new().with(journal.clone()), false);

    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 30);
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    keeper
        .remove_validator_tokens_and_shares(&ctx, &op(1), tokens(30))
        .unwrap();
    run_block(&mut keeper, &ctx);

    assert_eq!(
        journal.entries(),
        vec!["created 1", "bonded 1", "unbonding 1", "removed 1"]
    );
}

#[test]
fn draining_twice_at_the_same_time_is_a_no_op() {
    let journal = Arc::new(Journal::default());
    let mut keeper = keeper_with(5, HookSet::new().with(journal.clone()), false);

    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 30);
    stake(&mut keeper, &ctx, 2, 20);
    run_block(&mut keeper, &ctx);

    let ctx = block(2, genesis_time() + Duration::seconds(5));
    keeper
        .remove_validator_tokens_and_shares(&ctx, &op(1), tokens(10))
        .unwrap();
    keeper.jail(&ctx, &ConsIdentity::Main(key(1)).index_key()).unwrap();
    run_block(&mut keeper, &ctx);

    let matures_at = keeper.get_validator(&op(1)).unwrap().unwrap().unbonding_min_time;
    let due = block(3, matures_at);
    assert_eq!(keeper.drain_matured(&due).unwrap(), vec![op(1)]);
    let seen = journal.entries();

    assert!(keeper.drain_matured(&due).unwrap().is_empty());
    assert_eq!(journal.entries(), seen);
    assert_eq!(status(&keeper, 1), BondStatus::Unbonded);
    assert_eq!(keeper.pool().unwrap().loose_tokens, tokens(20));
    assert_invariants(&keeper);
}

#[test]
fn events_are_recorded_only_in_deliver_mode() {
    let mut keeper = keeper_with(5, HookSet::new(), true);
    let ctx = block(1, genesis_time());

    create(&mut keeper, &ctx.with_mode(RunMode::Check), 1);
    assert!(keeper.take_events().is_empty());

    create(&mut keeper, &ctx.with_tx(), 2);
    let events = keeper.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].operator(), &op(2));
    assert!(events[0].is_from_tx());

    run_block(&mut keeper, &ctx);
    keeper.remove_validator(&ctx, &op(2)).unwrap();
    let events = keeper.take_events();
    assert!(matches!(
        events.last(),
        Some(StakeEvent::ValidatorRemoved { is_from_tx: false, side_chain_id: None, .. })
    ));
}

// === Atomic commit ===

#[test]
fn discarded_block_leaves_backend_untouched() {
    init_tracing();
    let backend = MemStorage::new();
    let mut keeper =
        Keeper::new(backend.clone(), HookSet::new(), StakingConfig::default()).unwrap();
    let ctx = block(1, genesis_time());
    stake(&mut keeper, &ctx, 1, 30);
    keeper.end_block(&ctx).unwrap();

    assert!(!backend.has(Keyspace::Validators, op(1).as_bytes()).unwrap());
    keeper.discard();
    assert!(keeper.get_validator(&op(1)).unwrap().is_none());

    stake(&mut keeper, &ctx, 1, 30);
    keeper.end_block(&ctx).unwrap();
    keeper.commit().unwrap();
    assert!(backend.has(Keyspace::Validators, op(1).as_bytes()).unwrap());
    assert!(backend.has(Keyspace::LastValidatorPower, op(1).as_bytes()).unwrap());
}
