//! Money and tax rates in exact integer units.
//!
//! Amounts are held as **minor units** (paise, cents) so that the two-decimal
//! rounding rules of pricing are applied exactly once, at well-defined points,
//! instead of drifting through floating point arithmetic. On the wire an amount
//! is a decimal number of major units (`210.0`), which is how catalog prices and
//! order pricing are exchanged with clients.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An amount of the store currency, in minor units.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount an order may carry. Below it every amount survives the
    /// major-unit JSON form exactly.
    pub const MAX: Money = Money(1_000_000_000_000_000);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Convert a decimal major-unit amount, rounding to the nearest minor unit.
    ///
    /// This is `round(amount * 100)`; halves round away from zero.
    pub fn from_major(amount: f64) -> Self {
        Self((amount * 100.0).round() as i64)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Line total for `qty` units at this unit price; `None` past [`Money::MAX`].
    ///
    /// Exact: a two-decimal price times an integer quantity needs no rounding.
    pub fn checked_times(self, qty: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(qty)).and_then(Self::bounded)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).and_then(Self::bounded)
    }

    /// `round2(self * rate / 100)`, rounding half up on minor units.
    pub fn checked_percent(self, rate: TaxRate) -> Option<Self> {
        let scaled = i128::from(self.0) * i128::from(rate.basis_points());
        i64::try_from(div_round_half_up(scaled, 10_000))
            .ok()
            .and_then(Self::bounded)
    }

    fn bounded(minor: i64) -> Option<Self> {
        (minor.unsigned_abs() <= Self::MAX.0.unsigned_abs()).then_some(Self(minor))
    }
}

fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    if numerator >= 0 {
        (numerator + denominator / 2) / denominator
    } else {
        -((-numerator + denominator / 2) / denominator)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        if !amount.is_finite() {
            return Err(serde::de::Error::custom("amount must be a finite number"));
        }
        Ok(Money::from_major(amount))
    }
}

/// A percentage rate with two decimals of precision (e.g. `5`, `2.5`, `18`).
///
/// Stored as hundredths of a percent.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaxRate(u32);

impl TaxRate {
    pub const fn from_basis_points(bp: u32) -> Self {
        Self(bp)
    }

    /// Convert a percentage; negative or non-finite values clamp to zero.
    pub fn from_percent(percent: f64) -> Self {
        if !percent.is_finite() || percent <= 0.0 {
            return Self(0);
        }
        Self((percent * 100.0).round() as u32)
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }

    pub fn as_percent(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}

impl Serialize for TaxRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_percent())
    }
}

impl<'de> Deserialize<'de> for TaxRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(TaxRate::from_percent(f64::deserialize(deserializer)?))
    }
}
