//! Read views over a vehicle's ascending fill history.
//!
//! Overview, trend and monthly views recompute mileage pairwise at scale 2
//! instead of reading the stored 3dp `FillRecord::mileage`. Both scales are
//! observable output and are kept distinct.

use crate::domain::math::{self, MILEAGE_SCALE, MONEY_SCALE, PAIR_MILEAGE_SCALE, VOLUME_SCALE};
use crate::domain::{Decimal, FillRecord, MonthCode};
use chrono::NaiveDate;

/// One consecutive `(previous, current)` pair of fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillPair {
    /// Date of the later fill.
    pub date: NaiveDate,
    /// `current.odometer - previous.odometer`; may be zero or negative.
    pub distance: i64,
    /// Volume of the later fill; zero when missing.
    pub fuel: Decimal,
    /// `distance / fuel` at scale 2; `None` when the volume is not positive.
    pub mileage: Option<Decimal>,
}

/// Consecutive pairs in history order.
pub fn fill_pairs(history: &[FillRecord]) -> impl Iterator<Item = FillPair> + '_ {
    history.windows(2).map(|pair| {
        let (previous, current) = (&pair[0], &pair[1]);
        let distance = current
            .odometer_reading
            .saturating_sub(previous.odometer_reading);
        let fuel = current.fuel_volume_or_zero();
        FillPair {
            date: current.fill_date,
            distance,
            fuel,
            mileage: math::div(Decimal::from(distance), fuel, PAIR_MILEAGE_SCALE),
        }
    })
}

/// Pairwise mileages, skipping pairs whose mileage is undefined.
pub fn pair_mileages(history: &[FillRecord]) -> Vec<Decimal> {
    fill_pairs(history).filter_map(|p| p.mileage).collect()
}

fn odometer_span(history: &[FillRecord]) -> i64 {
    match (history.first(), history.last()) {
        (Some(first), Some(last)) if history.len() >= 2 => last
            .odometer_reading
            .saturating_sub(first.odometer_reading),
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewStats {
    pub last_fill_mileage: Decimal,
    pub average_mileage: Decimal,
    pub best_mileage: Decimal,
    pub worst_mileage: Decimal,
    pub total_distance: i64,
    pub total_fills: usize,
}

impl OverviewStats {
    fn zeroed(total_fills: usize, total_distance: i64) -> Self {
        let zero = math::round(Decimal::zero(), PAIR_MILEAGE_SCALE);
        Self {
            last_fill_mileage: zero,
            average_mileage: zero,
            best_mileage: zero,
            worst_mileage: zero,
            total_distance,
            total_fills,
        }
    }
}

/// Summary of the whole history.
///
/// Fewer than two fills yield an all-zero summary.
pub fn overview(history: &[FillRecord]) -> OverviewStats {
    if history.len() < 2 {
        return OverviewStats::zeroed(history.len(), 0);
    }

    let mileages = pair_mileages(history);
    let total_distance = odometer_span(history);

    let (Some(last), Some(average), Some(best), Some(worst)) = (
        mileages.last().copied(),
        math::mean(&mileages, PAIR_MILEAGE_SCALE),
        mileages.iter().max().copied(),
        mileages.iter().min().copied(),
    ) else {
        return OverviewStats::zeroed(history.len(), total_distance);
    };

    OverviewStats {
        last_fill_mileage: last,
        average_mileage: average,
        best_mileage: best,
        worst_mileage: worst,
        total_distance,
        total_fills: history.len(),
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub mileage: Decimal,
}

/// Pairwise mileage over time, oldest first, dated by the later fill.
pub fn trend(history: &[FillRecord]) -> Vec<TrendPoint> {
    fill_pairs(history)
        .filter_map(|p| p.mileage.map(|mileage| TrendPoint { date: p.date, mileage }))
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly
// ---------------------------------------------------------------------------

/// Finalized figures for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyBucket {
    pub avg_mileage: Decimal,
    pub distance_travelled: i64,
    pub fuel_consumed: Decimal,
}

/// Running totals for one month while folding over pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MonthAccumulator {
    mileage_sum: Decimal,
    distance: i64,
    fuel: Decimal,
}

impl MonthAccumulator {
    fn empty() -> Self {
        Self {
            mileage_sum: math::round(Decimal::zero(), PAIR_MILEAGE_SCALE),
            distance: 0,
            fuel: math::round(Decimal::zero(), VOLUME_SCALE),
        }
    }

    fn absorb(self, pair: &FillPair) -> Self {
        Self {
            mileage_sum: pair
                .mileage
                .map_or(self.mileage_sum, |m| self.mileage_sum + m),
            distance: self.distance.saturating_add(pair.distance),
            fuel: self.fuel + pair.fuel,
        }
    }

    /// A month with positive distance reports `distance / fuel`, discarding the
    /// per-pair sum. Any other month keeps the sum.
    fn finalize(self) -> MonthlyBucket {
        let avg_mileage = if self.distance > 0 {
            math::div(Decimal::from(self.distance), self.fuel, PAIR_MILEAGE_SCALE)
                .unwrap_or(self.mileage_sum)
        } else {
            self.mileage_sum
        };

        MonthlyBucket {
            avg_mileage,
            distance_travelled: self.distance,
            fuel_consumed: self.fuel,
        }
    }
}

/// Per-month breakdown for one year, always 12 entries in calendar order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyStats {
    pub year: i32,
    pub months: Vec<(MonthCode, MonthlyBucket)>,
}

impl MonthlyStats {
    pub fn get(&self, month: MonthCode) -> Option<&MonthlyBucket> {
        self.months
            .iter()
            .find(|(code, _)| *code == month)
            .map(|(_, bucket)| bucket)
    }

    pub fn total_distance(&self) -> i64 {
        self.months.iter().map(|(_, b)| b.distance_travelled).sum()
    }

    pub fn total_fuel(&self) -> Decimal {
        math::sum(self.months.iter().map(|(_, b)| b.fuel_consumed))
    }
}

/// Monthly breakdown of a history already filtered to `year`.
///
/// Each pair is attributed wholly to the month of its later fill.
pub fn monthly(history_for_year: &[FillRecord], year: i32) -> MonthlyStats {
    let initial: Vec<(MonthCode, MonthAccumulator)> = MonthCode::ALL
        .iter()
        .map(|code| (*code, MonthAccumulator::empty()))
        .collect();

    let accumulated = fill_pairs(history_for_year).fold(initial, |buckets, pair| {
        let target = MonthCode::of(pair.date);
        buckets
            .into_iter()
            .map(|(code, acc)| {
                if code == target {
                    (code, acc.absorb(&pair))
                } else {
                    (code, acc)
                }
            })
            .collect()
    });

    MonthlyStats {
        year,
        months: accumulated
            .into_iter()
            .map(|(code, acc)| (code, acc.finalize()))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Lifetime
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifetimeStats {
    pub total_fuel: Decimal,
    pub total_cost: Decimal,
    pub total_distance: i64,
    /// `total_distance / total_fuel`; `None` without fuel.
    pub average_mileage: Option<Decimal>,
    /// `total_cost / total_distance`; `None` without positive distance.
    pub cost_per_km: Option<Decimal>,
}

/// Lifetime totals, independent of the pairwise views.
pub fn lifetime(history: &[FillRecord]) -> LifetimeStats {
    let total_fuel = math::round(
        math::sum(history.iter().map(FillRecord::fuel_volume_or_zero)),
        VOLUME_SCALE,
    );
    let total_cost = math::round(
        math::sum(history.iter().map(|f| f.total_amount)),
        MONEY_SCALE,
    );
    let total_distance = odometer_span(history);

    LifetimeStats {
        total_fuel,
        total_cost,
        total_distance,
        average_mileage: math::div_two_stage(
            Decimal::from(total_distance),
            total_fuel,
            MILEAGE_SCALE,
        ),
        cost_per_km: math::div_two_stage(total_cost, Decimal::from(total_distance), MONEY_SCALE),
    }
}
