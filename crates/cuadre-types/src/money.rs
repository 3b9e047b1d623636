//! Currency arithmetic helpers.
//!
//! All monetary values are `rust_decimal::Decimal`. Ratios are carried at
//! full precision through intermediate steps; rounding (half-up to the
//! smallest currency unit) is applied only when a cascade entry or a final
//! transfer amount is materialized.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants;

/// Round half-up (midpoint away from zero) to the given decimal scale.
#[must_use]
pub fn round_half_up(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Round half-up to the default currency scale.
#[must_use]
pub fn round_currency(amount: Decimal) -> Decimal {
    round_half_up(amount, constants::CURRENCY_SCALE)
}

/// One minimal currency unit at the default scale (0.01).
#[must_use]
pub fn one_cent() -> Decimal {
    Decimal::new(1, constants::CURRENCY_SCALE)
}

/// Whether two amounts agree within one minimal currency unit.
#[must_use]
pub fn within_one_cent(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= one_cent()
}

/// Convert basis points (1 bp = 0.01%) to a decimal ratio.
#[must_use]
pub fn ratio_from_bps(bps: u32) -> Decimal {
    Decimal::new(i64::from(bps), 4).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_up_rounds_midpoint_away_from_zero() {
        assert_eq!(round_currency(Decimal::new(12345, 3)), Decimal::new(1235, 2)); // 12.345 -> 12.35
        assert_eq!(
            round_currency(Decimal::new(-12345, 3)),
            Decimal::new(-1235, 2) // -12.345 -> -12.35
        );
    }

    #[test]
    fn round_is_stable_on_exact_values() {
        let exact = Decimal::new(6400000, 2); // 64000.00
        assert_eq!(round_currency(exact), exact);
    }

    #[test]
    fn within_one_cent_bounds() {
        let a = Decimal::new(10000, 2);
        assert!(within_one_cent(a, a));
        assert!(within_one_cent(a, a + one_cent()));
        assert!(!within_one_cent(a, a + one_cent() + one_cent()));
    }

    #[test]
    fn bps_conversion() {
        assert_eq!(ratio_from_bps(5000), Decimal::new(5, 1)); // 0.50
        assert_eq!(ratio_from_bps(6000), Decimal::new(6, 1)); // 0.60
        assert_eq!(ratio_from_bps(2000), Decimal::new(2, 1)); // 0.20
    }
}
