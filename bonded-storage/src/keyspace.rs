//! Logical keyspaces of the staking store.
//!
//! Each keyspace is an independent ordered key-value table. The RocksDB
//! backend maps each one to a column family.

use std::fmt;
use std::ops::Bound;

/// A logical table in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyspace {
    /// Operator address -> validator record.
    Validators,
    /// Consensus address -> operator address.
    ValidatorsByConsAddr,
    /// Power key -> operator address.
    ValidatorsByPower,
    /// Operator address -> power reported at the end of the last block.
    LastValidatorPower,
    /// Maturity time -> operators finishing unbonding at that time.
    ValidatorQueue,
    /// Height -> bonded validator set recorded at that height.
    ValidatorsByHeight,
    /// Singletons: pool, params, counters.
    Meta,
}

impl Keyspace {
    /// Every keyspace, in a fixed order.
    pub const ALL: [Keyspace; 7] = [
        Keyspace::Validators,
        Keyspace::ValidatorsByConsAddr,
        Keyspace::ValidatorsByPower,
        Keyspace::LastValidatorPower,
        Keyspace::ValidatorQueue,
        Keyspace::ValidatorsByHeight,
        Keyspace::Meta,
    ];

    /// Column family name.
    pub fn name(self) -> &'static str {
        match self {
            Keyspace::Validators => "validators",
            Keyspace::ValidatorsByConsAddr => "validators_by_cons_addr",
            Keyspace::ValidatorsByPower => "validators_by_power",
            Keyspace::LastValidatorPower => "last_validator_power",
            Keyspace::ValidatorQueue => "validator_queue",
            Keyspace::ValidatorsByHeight => "validators_by_height",
            Keyspace::Meta => "meta",
        }
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Iteration direction of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Key bounds of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Bound<Vec<u8>>,
    pub end: Bound<Vec<u8>>,
}

impl KeyRange {
    /// The whole keyspace.
    pub fn all() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// Every key `<= end`.
    pub fn up_to_inclusive(end: impl Into<Vec<u8>>) -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Included(end.into()),
        }
    }

    /// Every key `>= start`.
    pub fn starting_at(start: impl Into<Vec<u8>>) -> Self {
        Self {
            start: Bound::Included(start.into()),
            end: Bound::Unbounded,
        }
    }

    /// Whether `key` falls inside the range.
    pub fn contains(&self, key: &[u8]) -> bool {
        let after_start = match &self.start {
            Bound::Included(s) => key >= s.as_slice(),
            Bound::Excluded(s) => key > s.as_slice(),
            Bound::Unbounded => true,
        };
        let before_end = match &self.end {
            Bound::Included(e) => key <= e.as_slice(),
            Bound::Excluded(e) => key < e.as_slice(),
            Bound::Unbounded => true,
        };
        after_start && before_end
    }

    /// Borrowed bounds, for `BTreeMap::range`.
    pub fn as_bounds(&self) -> (Bound<&[u8]>, Bound<&[u8]>) {
        (borrow(&self.start), borrow(&self.end))
    }
}

fn borrow(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_slice()),
        Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_unique() {
        let mut names: Vec<_> = Keyspace::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Keyspace::ALL.len());
    }

    #[test]
    fn test_range_contains() {
        let range = KeyRange::up_to_inclusive(vec![5]);
        assert!(range.contains(&[0]));
        assert!(range.contains(&[5]));
        assert!(!range.contains(&[5, 0]));
        assert!(!range.contains(&[6]));

        let range = KeyRange::starting_at(vec![3]);
        assert!(!range.contains(&[2, 255]));
        assert!(range.contains(&[3]));
        assert!(KeyRange::all().contains(&[]));
    }
}
