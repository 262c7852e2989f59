//! Decimal helpers shared by the calculators.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// The bound a saturating operation lands on.
fn saturated(negative: bool) -> Decimal {
    if negative { Decimal::MIN } else { Decimal::MAX }
}

/// `a * b`, saturating at `Decimal::MIN`/`Decimal::MAX`.
pub(crate) fn mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or_else(|| saturated(a.is_sign_negative() != b.is_sign_negative()))
}

/// `a + b`, saturating. Overflow needs both operands on the same side of zero.
pub(crate) fn add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b)
        .unwrap_or_else(|| saturated(a.is_sign_negative()))
}

/// `a - b`, saturating. Overflow keeps the sign of `a`.
pub(crate) fn sub(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b)
        .unwrap_or_else(|| saturated(a.is_sign_negative()))
}

/// Saturating sum.
pub(crate) fn sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, add)
}

/// `num / den`, or `None` when the denominator is not strictly positive.
/// A quotient too large to represent saturates instead.
pub(crate) fn ratio(num: Decimal, den: Decimal) -> Option<Decimal> {
    if den <= Decimal::ZERO {
        return None;
    }
    Some(
        num.checked_div(den)
            .unwrap_or_else(|| saturated(num.is_sign_negative())),
    )
}

/// `num / den`, with zero for a degenerate denominator.
pub(crate) fn ratio_or_zero(num: Decimal, den: Decimal) -> Decimal {
    ratio(num, den).unwrap_or(Decimal::ZERO)
}

/// Clamp a raw score to `0..=100`.
pub(crate) fn clamp_score(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE_HUNDRED)
}

/// Round to `dp` places, halves away from zero.
pub(crate) fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to a whole number, halves away from zero.
pub(crate) fn round_whole(value: Decimal) -> Decimal {
    round_dp(value, 0)
}

/// Clamp and round a raw score into the reported integer range.
pub(crate) fn to_score(value: Decimal) -> u8 {
    round_whole(clamp_score(value)).to_u8().unwrap_or(0)
}

/// Floor to a non-negative integer count.
pub(crate) fn floor_count(value: Decimal) -> u64 {
    if value <= Decimal::ZERO {
        return 0;
    }
    value.floor().to_u64().unwrap_or(u64::MAX)
}

/// Floor a money amount to whole units, never below zero.
pub(crate) fn floor_amount(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pow10(n: u32) -> Decimal {
        Decimal::from_i128_with_scale(10_i128.pow(n), 0)
    }

    #[test]
    fn ratio_rejects_non_positive_denominators() {
        assert_eq!(ratio(dec!(10), dec!(0)), None);
        assert_eq!(ratio(dec!(10), dec!(-2)), None);
        assert_eq!(ratio(dec!(10), dec!(4)), Some(dec!(2.5)));
    }

    #[test]
    fn ratio_saturates_instead_of_failing() {
        assert_eq!(ratio(pow10(28), dec!(0.01)), Some(Decimal::MAX));
        assert_eq!(ratio(-pow10(28), dec!(0.01)), Some(Decimal::MIN));
    }

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(mul(pow10(26), pow10(26)), Decimal::MAX);
        assert_eq!(mul(-pow10(26), pow10(26)), Decimal::MIN);
        assert_eq!(mul(dec!(1.5), dec!(4)), dec!(6));
        assert_eq!(add(Decimal::MAX, Decimal::ONE), Decimal::MAX);
        assert_eq!(sub(Decimal::MIN, Decimal::ONE), Decimal::MIN);
        assert_eq!(sub(dec!(5), dec!(7)), dec!(-2));
        assert_eq!(sum([Decimal::MAX, Decimal::MAX, dec!(-1)]), Decimal::MAX - Decimal::ONE);
        assert_eq!(sum(Vec::<Decimal>::new()), Decimal::ZERO);
    }

    #[test]
    fn scores_clamp_and_round_half_up() {
        assert_eq!(to_score(dec!(-12)), 0);
        assert_eq!(to_score(dec!(140)), 100);
        assert_eq!(to_score(dec!(66.5)), 67);
        assert_eq!(to_score(dec!(66.49)), 66);
    }

    #[test]
    fn floor_count_saturates_at_zero() {
        assert_eq!(floor_count(dec!(-3.2)), 0);
        assert_eq!(floor_count(dec!(7.99)), 7);
    }
}
