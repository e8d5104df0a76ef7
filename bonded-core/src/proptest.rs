//! Property-based tests for core types.
//!
//! Uses proptest to verify invariants hold for arbitrary inputs.

use proptest::prelude::*;

use crate::address::{ConsPubKey, ValAddress};
use crate::commission::Commission;
use crate::dec::{Dec, PRECISION_MULTIPLIER};
use crate::pool::Pool;
use crate::validator::{BondStatus, ConsIdentity, Description, Validator};

// ============================================================================
// Arbitrary Implementations
// ============================================================================

/// Token amounts up to one billion whole tokens.
fn arb_tokens() -> impl Strategy<Value = Dec> {
    (1i64..1_000_000_000 * PRECISION_MULTIPLIER).prop_map(Dec::from_raw)
}

/// Small decimals safe to multiply together.
fn arb_small_dec() -> impl Strategy<Value = Dec> {
    (-1_000_000i64..1_000_000).prop_map(|raw| Dec::from_raw(raw * 1000))
}

fn arb_status() -> impl Strategy<Value = BondStatus> {
    prop_oneof![
        Just(BondStatus::Unbonded),
        Just(BondStatus::Unbonding),
        Just(BondStatus::Bonded),
    ]
}

fn arb_validator() -> impl Strategy<Value = Validator> {
    (prop::array::uniform20(any::<u8>()), prop::array::uniform32(any::<u8>())).prop_map(
        |(op, key)| {
            Validator::new(
                ValAddress::from_bytes(op),
                ConsIdentity::Main(ConsPubKey::from_bytes(key)),
                Description::new("prop"),
                Commission::zero(Default::default()),
            )
        },
    )
}

fn supply() -> Pool {
    Pool::new(Dec::from_int(10_000_000_000))
}

// ============================================================================
// Decimal Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Display output parses back to the same value.
    #[test]
    fn dec_display_parse_roundtrip(raw in any::<i32>()) {
        let d = Dec::from_raw(raw as i64 * 3);
        let parsed: Dec = d.to_string().parse().unwrap();
        prop_assert_eq!(parsed, d);
    }

    /// Addition and subtraction are inverse.
    #[test]
    fn dec_add_sub_inverse(a in arb_small_dec(), b in arb_small_dec()) {
        prop_assert_eq!(a.add(b).sub(b), a);
    }

    /// Multiplication commutes.
    #[test]
    fn dec_mul_commutes(a in arb_small_dec(), b in arb_small_dec()) {
        prop_assert_eq!(a.mul(b), b.mul(a));
    }

    /// Dividing then multiplying loses at most one raw unit per operand scale.
    #[test]
    fn dec_quo_mul_close(a in arb_tokens(), b in 1i64..1_000_000) {
        let divisor = Dec::from_int(b);
        let back = a.quo(divisor).mul(divisor);
        prop_assert!((back.raw() - a.raw()).abs() <= b);
    }

    /// Ordering of Dec matches ordering of the raw value.
    #[test]
    fn dec_ordering(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(Dec::from_raw(a).cmp(&Dec::from_raw(b)), a.cmp(&b));
    }
}

// ============================================================================
// Validator / Pool Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Status changes never create or destroy tokens.
    #[test]
    fn status_changes_preserve_supply(
        v in arb_validator(),
        tokens in arb_tokens(),
        path in prop::collection::vec(arb_status(), 1..8),
    ) {
        let (mut v, mut pool, _) = v.add_tokens_from_del(supply(), tokens);
        let total = pool.total_supply();
        for status in path {
            let (nv, np) = v.update_status(pool, status);
            v = nv;
            pool = np;
            prop_assert_eq!(pool.bonded_tokens, v.bonded_tokens());
            prop_assert_eq!(pool.total_supply(), total);
        }
    }

    /// Removing shares then re-adding the released tokens restores the
    /// exchange rate up to rounding.
    #[test]
    fn shares_round_trip(
        v in arb_validator(),
        tokens in arb_tokens(),
        fraction in 1i64..100,
    ) {
        let (v, pool, shares) = v.add_tokens_from_del(supply(), tokens);
        let rate_before = v.delegator_share_ex_rate();

        let to_remove = shares.mul(Dec::with_places(fraction, 2));
        let (v, pool, released) = v.remove_del_shares(pool, to_remove);
        let (v, _, reissued) = v.add_tokens_from_del(pool, released);

        prop_assert_eq!(v.tokens, tokens);
        prop_assert!((reissued.raw() - to_remove.raw()).abs() <= 1);
        prop_assert!((v.delegator_share_ex_rate().raw() - rate_before.raw()).abs() <= 1);
    }
}

