//! Fixed-point decimal used for tokens, shares and commission rates.
//!
//! A [`Dec`] is a signed 64-bit integer scaled by 10^8. The raw integer is
//! what consensus sees as voting power, so arithmetic must be identical on
//! every node: no floats, overflow is an invariant violation, and
//! multiplication/division round half to even.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::invariant::{violated, InvariantViolation};

/// Number of decimal places.
pub const PRECISION: u32 = 8;

/// 10^PRECISION.
pub const PRECISION_MULTIPLIER: i64 = 100_000_000;

/// Fixed-point decimal with 8 decimal places.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dec(i64);

impl Dec {
    /// Zero.
    pub const ZERO: Dec = Dec(0);

    /// One.
    pub const ONE: Dec = Dec(PRECISION_MULTIPLIER);

    /// Create from the raw scaled representation.
    pub const fn from_raw(raw: i64) -> Self {
        Dec(raw)
    }

    /// Create from a whole number.
    pub fn from_int(n: i64) -> Self {
        match n.checked_mul(PRECISION_MULTIPLIER) {
            Some(raw) => Dec(raw),
            None => overflow("from_int", n, PRECISION_MULTIPLIER),
        }
    }

    /// Create `num / 10^places`, e.g. `with_places(5, 2)` is 0.05.
    pub fn with_places(num: i64, places: u32) -> Self {
        assert!(places <= PRECISION, "too many decimal places: {places}");
        Dec::from_int(num).quo_int(10i64.pow(places))
    }

    /// The raw scaled integer.
    pub const fn raw(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn abs(self) -> Self {
        Dec(self.0.abs())
    }

    /// Integer part, rounding toward zero.
    pub fn truncate_int(self) -> i64 {
        self.0 / PRECISION_MULTIPLIER
    }

    pub fn add(self, other: Dec) -> Dec {
        match self.0.checked_add(other.0) {
            Some(raw) => Dec(raw),
            None => overflow("add", self.0, other.0),
        }
    }

    pub fn sub(self, other: Dec) -> Dec {
        match self.0.checked_sub(other.0) {
            Some(raw) => Dec(raw),
            None => overflow("sub", self.0, other.0),
        }
    }

    /// Multiply, rounding half to even.
    pub fn mul(self, other: Dec) -> Dec {
        let product = self.0 as i128 * other.0 as i128;
        Dec(narrow("mul", div_round_half_even(product, PRECISION_MULTIPLIER as i128)))
    }

    /// Divide, rounding half to even. Division by zero is an invariant
    /// violation: every caller guards the divisor.
    pub fn quo(self, other: Dec) -> Dec {
        if other.is_zero() {
            violated(InvariantViolation::new("decimal", "division by zero"));
        }
        let scaled = self.0 as i128 * PRECISION_MULTIPLIER as i128;
        Dec(narrow("quo", div_round_half_even(scaled, other.0 as i128)))
    }

    /// Divide by an integer, rounding half to even.
    pub fn quo_int(self, n: i64) -> Dec {
        if n == 0 {
            violated(InvariantViolation::new("decimal", "division by zero"));
        }
        Dec(narrow("quo_int", div_round_half_even(self.0 as i128, n as i128)))
    }

    pub fn checked_add(self, other: Dec) -> Option<Dec> {
        self.0.checked_add(other.0).map(Dec)
    }

    pub fn checked_sub(self, other: Dec) -> Option<Dec> {
        self.0.checked_sub(other.0).map(Dec)
    }
}

fn div_round_half_even(num: i128, den: i128) -> i128 {
    let quo = num / den;
    let rem = num % den;
    if rem == 0 {
        return quo;
    }
    let twice = rem.abs() * 2;
    let den_abs = den.abs();
    let away = if (num < 0) != (den < 0) { -1 } else { 1 };
    if twice > den_abs || (twice == den_abs && quo % 2 != 0) {
        quo + away
    } else {
        quo
    }
}

fn narrow(op: &str, value: i128) -> i64 {
    match i64::try_from(value) {
        Ok(v) => v,
        Err(_) => violated(InvariantViolation::new(
            "decimal",
            format!("{op} result {value} out of range"),
        )),
    }
}

fn overflow(op: &str, a: i64, b: i64) -> ! {
    violated(InvariantViolation::new(
        "decimal",
        format!("{op} overflow: {a}, {b}"),
    ))
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = (self.0 as i128).abs();
        let int = abs / PRECISION_MULTIPLIER as i128;
        let frac = abs % PRECISION_MULTIPLIER as i128;
        write!(f, "{sign}{int}.{frac:08}")
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

impl FromStr for Dec {
    type Err = Error;

    /// Parse `"12"`, `"-0.5"` or `"3.14159265"`. More than 8 decimal places
    /// is rejected rather than rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || Error::invalid_amount(format!("invalid decimal: {s:?}"));

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty()
            || frac_part.len() > PRECISION as usize
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(bad());
        }

        let int: i64 = int_part.parse().map_err(|_| bad())?;
        let frac: i64 = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{frac_part:0<8}");
            padded.parse().map_err(|_| bad())?
        };

        let raw = int
            .checked_mul(PRECISION_MULTIPLIER)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(bad)?;
        Ok(Dec(if negative { -raw } else { raw }))
    }
}
