//! Exact money amounts in minor currency units.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are stored as `i64` minor units (one FCFA for XOF, which has no
//! sub-unit). Rates and percentages go through `rust_decimal::Decimal` and are
//! rounded back to whole minor units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The operation overflowed the `i64` range.
    #[error("Amount overflow")]
    Overflow,

    /// A rate was negative.
    #[error("Invalid rate: {0}")]
    InvalidRate(Decimal),

    /// A decimal value has a fractional minor-unit part.
    #[error("Amount {0} is not a whole number of minor units")]
    NotWholeUnits(Decimal),
}

/// An amount in minor currency units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Montant(i64);

impl Montant {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn new(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// Returns the raw minor-unit value.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is strictly negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, failing on overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Subtracts two amounts, failing on overflow.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Negates the amount, failing on overflow.
    pub fn checked_neg(self) -> Result<Self, MoneyError> {
        self.0.checked_neg().map(Self).ok_or(MoneyError::Overflow)
    }

    /// Sums a sequence of amounts, failing on overflow.
    pub fn sum<I>(amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Applies a percentage rate (e.g. `18` for 18%) and rounds half away
    /// from zero to whole minor units.
    pub fn apply_rate(self, rate_percent: Decimal) -> Result<Self, MoneyError> {
        if rate_percent.is_sign_negative() && !rate_percent.is_zero() {
            return Err(MoneyError::InvalidRate(rate_percent));
        }

        let raw = Decimal::from(self.0)
            .checked_mul(rate_percent)
            .ok_or(MoneyError::Overflow)?
            / Decimal::ONE_HUNDRED;

        let rounded = raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        rounded.to_i64().map(Self).ok_or(MoneyError::Overflow)
    }

    /// Returns `self / total * 100` rounded to two decimals, or zero when
    /// `total` is zero. For display; compare thresholds with `ratio_percent`.
    #[must_use]
    pub fn percent_of(self, total: Self) -> Decimal {
        self.ratio_percent(total).round_dp(2)
    }

    /// Returns `self / total * 100` without rounding, or zero when `total`
    /// is zero.
    #[must_use]
    pub fn ratio_percent(self, total: Self) -> Decimal {
        if total.is_zero() {
            return Decimal::ZERO;
        }
        Decimal::from(self.0) / Decimal::from(total.0) * Decimal::ONE_HUNDRED
    }

    /// Returns the amount as a `Decimal`.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl From<i64> for Montant {
    fn from(minor_units: i64) -> Self {
        Self(minor_units)
    }
}

impl TryFrom<Decimal> for Montant {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.fract() != Decimal::ZERO {
            return Err(MoneyError::NotWholeUnits(value));
        }
        value.to_i64().map(Self).ok_or(MoneyError::Overflow)
    }
}

impl std::fmt::Display for Montant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
