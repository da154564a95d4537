//! Rounding and scale policy shared by every numeric computation.
//!
//! Callers always name the output scale. Sums are exact; rounding only ever
//! happens at a multiplication or division step.

use crate::domain::Decimal;
use rust_decimal::RoundingStrategy;

/// Round half away from zero (`2.345 -> 2.35`, `-2.345 -> -2.35`).
pub const HALF_UP: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Precision of the first step of a two-stage division.
pub const INTERMEDIATE_SCALE: u32 = 6;
/// Currency amounts (total amount, total cost, cost per km).
pub const MONEY_SCALE: u32 = 2;
/// Fuel volumes in liters.
pub const VOLUME_SCALE: u32 = 3;
/// Mileage persisted on a fill record and lifetime average mileage.
pub const MILEAGE_SCALE: u32 = 3;
/// Price per liter.
pub const PRICE_SCALE: u32 = 2;
/// Mileage recomputed pairwise for overview, trend and monthly views.
pub const PAIR_MILEAGE_SCALE: u32 = 2;

/// Round half-up to exactly `scale` fractional digits, padding with zeros.
pub fn round(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.inner().round_dp_with_strategy(scale, HALF_UP);
    rounded.rescale(scale);
    Decimal::new(rounded)
}

/// `a * b` rounded to the money scale.
pub fn mul(a: Decimal, b: Decimal) -> Decimal {
    round(Decimal::new(a.inner().saturating_mul(b.inner())), MONEY_SCALE)
}

/// `numerator / denominator` rounded once to `scale`.
///
/// Returns `None` when the denominator is zero or negative.
pub fn div(numerator: Decimal, denominator: Decimal, scale: u32) -> Option<Decimal> {
    if !denominator.is_positive() {
        return None;
    }
    numerator
        .inner()
        .checked_div(denominator.inner())
        .map(|q| round(Decimal::new(q), scale))
}

/// Division rounded to [`INTERMEDIATE_SCALE`] first, then to `scale`.
pub fn div_two_stage(numerator: Decimal, denominator: Decimal, scale: u32) -> Option<Decimal> {
    div(numerator, denominator, INTERMEDIATE_SCALE).map(|q| round(q, scale))
}

/// Exact sum.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().sum()
}

/// Arithmetic mean rounded once to `scale`; `None` for an empty slice.
pub fn mean(values: &[Decimal], scale: u32) -> Option<Decimal> {
    div(sum(values.iter().copied()), count(values), scale)
}

/// Arithmetic mean with a two-stage rounding; `None` for an empty slice.
pub fn mean_two_stage(values: &[Decimal], scale: u32) -> Option<Decimal> {
    div_two_stage(sum(values.iter().copied()), count(values), scale)
}

fn count(values: &[Decimal]) -> Decimal {
    Decimal::from(values.len() as i64)
}
