//! Store-wide invariant checks.
//!
//! These walk whole keyspaces and are meant for tests and audit tooling,
//! not for the block path. Run them between blocks: mid-block the last
//! reported set is legitimately stale.

use std::collections::BTreeMap;

use bonded_core::{Dec, InvariantViolation, ValAddress, Validator};
use bonded_storage::{BatchWriter, Direction, KeyRange, Keyspace, KvStore};

use crate::keeper::Keeper;
use crate::keys;

/// Every non-jailed validator has exactly one power entry under its current
/// key, and every entry points at such a validator.
pub fn check_power_index<S: KvStore + BatchWriter>(
    keeper: &Keeper<S>,
) -> Result<(), InvariantViolation> {
    let validators = all_validators(keeper)?;
    let entries = keeper
        .store()
        .scan(Keyspace::ValidatorsByPower, &KeyRange::all(), Direction::Forward, None)
        .map_err(read_failed)?;

    let mut indexed: BTreeMap<ValAddress, Vec<u8>> = BTreeMap::new();
    for (key, value) in entries {
        let operator = ValAddress::from_slice(&value).map_err(read_failed)?;
        if keys::operator_from_power_key(&key).map_err(read_failed)? != operator {
            return Err(InvariantViolation::new(
                "power_index",
                format!("power key for {operator} encodes another operator"),
            ));
        }
        if indexed.insert(operator, key).is_some() {
            return Err(InvariantViolation::new(
                "power_index",
                format!("validator {operator} indexed more than once"),
            ));
        }
    }

    for validator in &validators {
        match (validator.jailed, indexed.remove(&validator.operator)) {
            (true, Some(_)) => {
                return Err(InvariantViolation::new(
                    "power_index",
                    format!("jailed validator {} is indexed", validator.operator),
                ))
            }
            (false, None) => {
                return Err(InvariantViolation::new(
                    "power_index",
                    format!("validator {} missing from power index", validator.operator),
                ))
            }
            (false, Some(key)) if key != keys::power_key(validator) => {
                return Err(InvariantViolation::new(
                    "power_index",
                    format!("stale power entry for validator {}", validator.operator),
                ))
            }
            _ => {}
        }
    }

    match indexed.keys().next() {
        Some(orphan) => Err(InvariantViolation::new(
            "power_index",
            format!("power entry for unknown validator {orphan}"),
        )),
        None => Ok(()),
    }
}

/// The pool's bonded bucket equals the tokens of bonded validators, and the
/// loose bucket covers the tokens of all others.
pub fn check_bonded_pool<S: KvStore + BatchWriter>(
    keeper: &Keeper<S>,
) -> Result<(), InvariantViolation> {
    let pool = keeper.pool().map_err(read_failed)?;
    let mut bonded = Dec::ZERO;
    let mut not_bonded = Dec::ZERO;
    for validator in all_validators(keeper)? {
        if validator.is_bonded() {
            bonded = bonded.add(validator.tokens);
        } else {
            not_bonded = not_bonded.add(validator.tokens);
        }
    }

    if pool.bonded_tokens != bonded {
        return Err(InvariantViolation::new(
            "bonded_pool",
            format!(
                "pool bonded tokens {} but bonded validators hold {bonded}",
                pool.bonded_tokens
            ),
        ));
    }
    if pool.loose_tokens < not_bonded {
        return Err(InvariantViolation::new(
            "bonded_pool",
            format!(
                "pool loose tokens {} below the {not_bonded} held by unbonded validators",
                pool.loose_tokens
            ),
        ));
    }
    Ok(())
}

/// The last reported set fits `max_validators`, holds only bonded
/// validators at their reported power, and sums to the last total power.
pub fn check_last_validator_set<S: KvStore + BatchWriter>(
    keeper: &Keeper<S>,
) -> Result<(), InvariantViolation> {
    let max = keeper.params().map_err(read_failed)?.max_validators as usize;
    let last = keeper.get_last_validator_powers().map_err(read_failed)?;
    if last.len() > max {
        return Err(InvariantViolation::new(
            "last_validator_set",
            format!("{} validators in a set capped at {max}", last.len()),
        ));
    }

    let mut total: i64 = 0;
    for (operator, power) in &last {
        let validator = keeper
            .get_validator(operator)
            .map_err(read_failed)?
            .ok_or_else(|| {
                InvariantViolation::new(
                    "last_validator_set",
                    format!("reported validator {operator} has no record"),
                )
            })?;
        if !validator.is_bonded() {
            return Err(InvariantViolation::new(
                "last_validator_set",
                format!("reported validator {operator} is {}", validator.status),
            ));
        }
        if validator.power() != *power {
            return Err(InvariantViolation::new(
                "last_validator_set",
                format!(
                    "validator {operator} reported at {power} but has power {}",
                    validator.power()
                ),
            ));
        }
        total = total.checked_add(*power).ok_or_else(|| {
            InvariantViolation::new("last_validator_set", "reported power overflows")
        })?;
    }

    let recorded = keeper.get_last_total_power().map_err(read_failed)?;
    if !last.is_empty() && recorded != total {
        return Err(InvariantViolation::new(
            "last_validator_set",
            format!("last total power {recorded} but reported powers sum to {total}"),
        ));
    }
    Ok(())
}

/// Every Unbonding validator sits in exactly one timeslice, the one of its
/// unbonding time. Entries for other validators are tolerated; draining
/// skips them.
pub fn check_unbonding_queue<S: KvStore + BatchWriter>(
    keeper: &Keeper<S>,
) -> Result<(), InvariantViolation> {
    let slices = keeper
        .store()
        .scan(Keyspace::ValidatorQueue, &KeyRange::all(), Direction::Forward, None)
        .map_err(read_failed)?;

    let mut seen: BTreeMap<ValAddress, Vec<Vec<u8>>> = BTreeMap::new();
    for (key, value) in slices {
        let operators: Vec<ValAddress> =
            crate::keeper::decode(Keyspace::ValidatorQueue, &value).map_err(read_failed)?;
        for operator in operators {
            seen.entry(operator).or_default().push(key.clone());
        }
    }

    for validator in all_validators(keeper)?.iter().filter(|v| v.is_unbonding()) {
        let expected = keys::queue_key(validator.unbonding_min_time);
        match seen.get(&validator.operator).map(Vec::as_slice) {
            Some([key]) if *key == expected => {}
            Some([]) | None => {
                return Err(InvariantViolation::new(
                    "unbonding_queue",
                    format!("unbonding validator {} is not queued", validator.operator),
                ))
            }
            Some(found) => {
                return Err(InvariantViolation::new(
                    "unbonding_queue",
                    format!(
                        "unbonding validator {} queued {} times or at the wrong time",
                        validator.operator,
                        found.len()
                    ),
                ))
            }
        }
    }
    Ok(())
}

fn all_validators<S: KvStore + BatchWriter>(
    keeper: &Keeper<S>,
) -> Result<Vec<Validator>, InvariantViolation> {
    keeper.get_all_validators().map_err(read_failed)
}

fn read_failed(e: impl std::fmt::Display) -> InvariantViolation {
    InvariantViolation::new("store_read", e.to_string())
}
