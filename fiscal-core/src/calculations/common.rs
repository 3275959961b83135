//! Shared numeric helpers for the fiscal calculations.
//!
//! Every calculation in this crate works on exact [`Decimal`] values and
//! never rounds intermediate results. Rounding is applied at presentation
//! time with [`round_half_up`].

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two decimal values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-100.00), dec!(0)), dec!(0));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Returns the smaller of two decimal values.
pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}

/// Divides `numerator` by `denominator`, yielding zero when the denominator
/// is zero.
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::common::safe_div;
///
/// assert_eq!(safe_div(dec!(10), dec!(4)), dec!(2.5));
/// assert_eq!(safe_div(dec!(10), Decimal::ZERO), Decimal::ZERO);
/// ```
pub fn safe_div(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
    }
}

/// Raises `base` to a non-negative integer power by repeated multiplication.
///
/// Saturates at [`Decimal::MAX`] instead of overflowing.
pub fn powi(
    base: Decimal,
    exponent: u32,
) -> Decimal {
    let mut result = Decimal::ONE;
    for _ in 0..exponent {
        result = result.saturating_mul(base);
    }
    result
}

/// Growth factor `(1 + rate)^years`.
pub fn growth_factor(
    rate: Decimal,
    years: u32,
) -> Decimal {
    powi(Decimal::ONE + rate, years)
}

/// Sums an iterator of decimals.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(46511.655)), dec!(46511.66));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn round_half_up_carries_into_integer_part() {
        assert_eq!(round_half_up(dec!(999999.999)), dec!(1000000.00));
    }

    // =========================================================================
    // max / min tests
    // =========================================================================

    #[test]
    fn max_picks_larger_value() {
        assert_eq!(max(dec!(-50), dec!(50)), dec!(50));
        assert_eq!(max(dec!(200), dec!(100)), dec!(200));
    }

    #[test]
    fn min_picks_smaller_value() {
        assert_eq!(min(dec!(-50), dec!(50)), dec!(-50));
        assert_eq!(min(dec!(150), dec!(150)), dec!(150));
    }

    // =========================================================================
    // safe_div tests
    // =========================================================================

    #[test]
    fn safe_div_divides_normally() {
        assert_eq!(safe_div(dec!(1), dec!(8)), dec!(0.125));
    }

    #[test]
    fn safe_div_returns_zero_for_zero_denominator() {
        assert_eq!(safe_div(dec!(100000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn safe_div_returns_zero_for_negative_zero_denominator() {
        assert_eq!(safe_div(dec!(5), dec!(-0.00)), Decimal::ZERO);
    }

    // =========================================================================
    // powi / growth_factor tests
    // =========================================================================

    #[test]
    fn powi_zero_exponent_is_one() {
        assert_eq!(powi(dec!(1.025), 0), Decimal::ONE);
    }

    #[test]
    fn powi_multiplies_repeatedly() {
        assert_eq!(powi(dec!(1.1), 3), dec!(1.331));
    }

    #[test]
    fn powi_saturates_instead_of_overflowing() {
        assert_eq!(powi(dec!(1000000), 10), Decimal::MAX);
    }

    #[test]
    fn growth_factor_compounds_rate() {
        assert_eq!(growth_factor(dec!(0.02), 2), dec!(1.0404));
    }

    #[test]
    fn sum_adds_all_values() {
        assert_eq!(sum([dec!(1.5), dec!(2.5), dec!(-1)]), dec!(3.0));
        assert_eq!(sum(Vec::<Decimal>::new()), Decimal::ZERO);
    }
}
