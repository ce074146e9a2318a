//! Money helpers.
//!
//! Amounts are `Decimal` values with two fractional digits. Persistent
//! backends store them as integer minor units so balance guards can be
//! evaluated by the database.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept for every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to two decimal places, half away from zero.
///
/// The result always carries exactly two fractional digits.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `round(amount * percent / 100, 2)`.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / Decimal::ONE_HUNDRED)
}

/// Convert an amount to minor units (cents).
///
/// Returns `None` if the value does not fit in an `i64`.
pub fn to_minor(amount: Decimal) -> Option<i64> {
    round_money(amount)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .trunc()
        .to_i64()
}

/// Convert minor units back into a two-digit decimal amount.
pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, MONEY_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(1004, 3)), Decimal::new(100, 2));
        assert_eq!(round_money(Decimal::new(-1005, 3)), Decimal::new(-101, 2));
        assert_eq!(round_money(Decimal::new(5, 0)).to_string(), "5.00");
    }

    #[test]
    fn test_percent_of() {
        // 10% of 12.35 = 1.235 -> 1.24
        assert_eq!(
            percent_of(Decimal::new(1235, 2), Decimal::TEN),
            Decimal::new(124, 2)
        );
        assert_eq!(percent_of(Decimal::new(1, 2), Decimal::ONE), Decimal::ZERO);
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor(Decimal::new(2000, 2)), Some(2000));
        assert_eq!(to_minor(Decimal::new(5, 0)), Some(500));
        assert_eq!(from_minor(3500), Decimal::new(35, 0));
        assert_eq!(from_minor(-1), Decimal::new(-1, 2));
    }
}
