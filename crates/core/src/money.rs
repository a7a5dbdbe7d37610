use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;
use thiserror::Error;

/// Signed amount in minor currency units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount out of range: {0}")]
    OutOfRange(String),
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn to_cents(self) -> i64 {
        self.0
    }

    /// Rounds to cents. `i64::MIN` cents is rejected so that every amount
    /// can be negated.
    pub fn from_decimal(decimal: Decimal) -> Result<Self, MoneyError> {
        decimal
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::from(100))
            .and_then(|cents| cents.to_i64())
            .filter(|cents| *cents != i64::MIN)
            .map(Money)
            .ok_or_else(|| MoneyError::OutOfRange(decimal.to_string()))
    }

    pub fn zero() -> Self {
        Money(0)
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
        Money(self.0.saturating_abs())
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses a plain decimal string such as `"100.50"` or `"-3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let decimal =
            Decimal::from_str(s).map_err(|_| MoneyError::InvalidAmount(s.to_string()))?;
        Money::from_decimal(decimal)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", Decimal::new(self.0, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings_to_cents() {
        assert_eq!("100.50".parse::<Money>().unwrap().to_cents(), 10050);
        assert_eq!("-3".parse::<Money>().unwrap().to_cents(), -300);
        assert_eq!(" 0.07 ".parse::<Money>().unwrap().to_cents(), 7);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!("1.005".parse::<Money>().unwrap().to_cents(), 101);
        assert_eq!("-1.005".parse::<Money>().unwrap().to_cents(), -101);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!("12,x".parse::<Money>(), Err(MoneyError::InvalidAmount(_))));
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn amounts_beyond_i64_cents_are_out_of_range() {
        assert!(matches!(
            "79228162514264337593543950335".parse::<Money>(),
            Err(MoneyError::OutOfRange(_))
        ));
        assert!(matches!(
            "-92233720368547758.08".parse::<Money>(),
            Err(MoneyError::OutOfRange(_))
        ));
        assert_eq!(
            "92233720368547758.07".parse::<Money>().unwrap().to_cents(),
            i64::MAX
        );
        assert_eq!(Money::from_cents(i64::MIN).abs().to_cents(), i64::MAX);
    }

    #[test]
    fn display_has_two_decimals() {
        assert_eq!(Money::from_cents(5000).to_string(), "50.00");
        assert_eq!(Money::from_cents(-7).to_string(), "-0.07");
    }

    #[test]
    fn negation_and_abs() {
        let m = Money::from_cents(-5000);
        assert_eq!(-m, Money::from_cents(5000));
        assert_eq!(m.abs(), Money::from_cents(5000));
        assert!(m.is_negative());
        assert!(!m.is_zero());
    }
}
