//! Property-based tests for the validator set engine.

use std::collections::BTreeSet;

use chrono::Duration;
use proptest::prelude::*;

use bonded_core::Dec;

use crate::invariants;
use crate::testutil::*;

/// Whole-token stakes for up to eight validators; zero leaves one unstaked.
fn arb_stakes() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..1_000, 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The bonded set is the top of the stake ranking, and nothing is
    /// reported twice.
    #[test]
    fn prop_bonded_set_is_top_ranked(stakes in arb_stakes(), max in 1u16..5) {
        let (mut keeper, ctx) = setup(max);
        for (i, tokens) in stakes.iter().enumerate() {
            let n = i as u8 + 1;
            create(&mut keeper, &ctx, n);
            if *tokens > 0 {
                delegate(&mut keeper, &ctx, n, *tokens);
            }
        }

        let (bonded, updates) = keeper.apply_and_return_validator_set_updates(&ctx).unwrap();

        let keys: BTreeSet<_> = updates.iter().map(|u| u.pub_key).collect();
        prop_assert_eq!(keys.len(), updates.len());

        let mut expected: Vec<(i64, u8)> = stakes
            .iter()
            .enumerate()
            .filter(|(_, t)| **t > 0)
            .map(|(i, t)| (*t, i as u8 + 1))
            .collect();
        // Equal stakes: the earlier delegation ranks first.
        expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        expected.truncate(max as usize);
        let got: Vec<_> = bonded
            .iter()
            .map(|v| (v.tokens.truncate_int(), v.operator.as_bytes()[0]))
            .collect();
        prop_assert_eq!(got, expected);
    }

    /// Invariants survive a sequence of stake changes across blocks.
    #[test]
    fn prop_invariants_hold_across_blocks(
        rounds in prop::collection::vec((1u8..5, 1i64..500), 1..12)
    ) {
        let (mut keeper, genesis) = setup(2);
        for n in 1..5 {
            create(&mut keeper, &genesis, n);
        }

        let mut ctx = genesis;
        for (n, tokens) in rounds {
            ctx = next_block(&ctx, 1, Duration::days(1));
            keeper.begin_block(&ctx, &Default::default()).unwrap();
            delegate(&mut keeper, &ctx, n, tokens);
            keeper.end_block(&ctx).unwrap();
            keeper.commit().unwrap();

            prop_assert!(invariants::check_power_index(&keeper).is_ok());
            prop_assert!(invariants::check_bonded_pool(&keeper).is_ok());
            prop_assert!(invariants::check_last_validator_set(&keeper).is_ok());
            prop_assert!(invariants::check_unbonding_queue(&keeper).is_ok());
        }
    }

    /// Removing some shares and adding the released tokens back restores
    /// the validator's tokens exactly.
    #[test]
    fn prop_remove_then_add_round_trip(stake_tokens in 2i64..1_000_000, percent in 1i64..100) {
        let (mut keeper, ctx) = setup(10);
        let before = stake(&mut keeper, &ctx, 1, stake_tokens);
        let shares = before.delegator_shares.mul(Dec::with_places(percent, 2));

        let (_, released) = keeper
            .remove_validator_tokens_and_shares(&ctx, &addr(1), shares)
            .unwrap();
        let (after, _) = keeper
            .add_validator_tokens_and_shares(&ctx, &addr(1), released)
            .unwrap();

        prop_assert_eq!(after.tokens, before.tokens);
        prop_assert_eq!(keeper.pool().unwrap().loose_tokens, before.tokens);
    }
}
