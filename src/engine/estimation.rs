//! Fills in a missing fuel volume or price from the vehicle's recent history.

use crate::domain::math::{self, MILEAGE_SCALE, PRICE_SCALE, VOLUME_SCALE};
use crate::domain::ordering::{latest_on_or_before, newest_first};
use crate::domain::{Decimal, FillRecord, VehicleId};
use chrono::NaiveDate;
use thiserror::Error;

/// Number of recent qualifying fills averaged for an estimate.
pub const ESTIMATION_WINDOW: usize = 5;

/// A new fill as submitted by a client. Volume and price may be omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillRequest {
    pub vehicle_id: VehicleId,
    pub fill_date: NaiveDate,
    pub odometer_reading: i64,
    pub fuel_volume: Option<Decimal>,
    pub price_per_liter: Option<Decimal>,
    pub notes: Option<String>,
}

/// Volume and price after estimation, at their storage scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFill {
    pub fuel_volume: Decimal,
    pub price_per_liter: Decimal,
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimationError {
    #[error("Insufficient data to estimate {}; supply it explicitly", .missing.join(" and "))]
    InsufficientData { missing: Vec<&'static str> },
    #[error("{field} must be > 0 after rounding to {scale} decimal places")]
    NonPositive { field: &'static str, scale: u32 },
}

pub struct EstimationEngine;

impl EstimationEngine {
    /// Resolve volume and price for `request`.
    ///
    /// `history` holds the vehicle's existing fills and excludes the one being
    /// created. Supplied values are kept (rounded to their storage scale); a
    /// missing value is estimated from the rolling window.
    ///
    /// # Errors
    /// Returns `InsufficientData` when a missing value cannot be estimated,
    /// which is always the case for a vehicle's first fill, and `NonPositive`
    /// when a supplied value rounds to zero at its storage scale.
    pub fn resolve(
        request: &FillRequest,
        history: &[FillRecord],
    ) -> Result<ResolvedFill, EstimationError> {
        let mut estimated = false;

        let fuel_volume = match request.fuel_volume {
            Some(volume) => Some(supplied(volume, "fuelVolume", VOLUME_SCALE)?),
            None => {
                let volume = Self::estimate_volume(request, history);
                estimated |= volume.is_some();
                volume
            }
        };

        let price_per_liter = match request.price_per_liter {
            Some(price) => Some(supplied(price, "pricePerLiter", PRICE_SCALE)?),
            None => {
                let price = rolling_average_price(history);
                estimated |= price.is_some();
                price
            }
        };

        match (fuel_volume, price_per_liter) {
            (Some(fuel_volume), Some(price_per_liter)) => Ok(ResolvedFill {
                fuel_volume,
                price_per_liter,
                estimated,
            }),
            (fuel_volume, price_per_liter) => {
                let mut missing = Vec::new();
                if fuel_volume.is_none() {
                    missing.push("fuelVolume");
                }
                if price_per_liter.is_none() {
                    missing.push("pricePerLiter");
                }
                Err(EstimationError::InsufficientData { missing })
            }
        }
    }

    /// `distance since previous fill / rolling average mileage`.
    ///
    /// `None` without a previous fill, without a rolling average, or when the
    /// distance is not positive.
    fn estimate_volume(request: &FillRequest, history: &[FillRecord]) -> Option<Decimal> {
        let previous = latest_on_or_before(history, request.fill_date)?;
        let distance = request
            .odometer_reading
            .saturating_sub(previous.odometer_reading);
        let average = rolling_average_mileage(history)?;

        math::div(Decimal::from(distance), average, VOLUME_SCALE).filter(Decimal::is_positive)
    }
}

fn supplied(value: Decimal, field: &'static str, scale: u32) -> Result<Decimal, EstimationError> {
    let rounded = math::round(value, scale);
    if !rounded.is_positive() {
        return Err(EstimationError::NonPositive { field, scale });
    }
    Ok(rounded)
}

/// Average of the latest positive mileages, scale 3.
pub fn rolling_average_mileage(history: &[FillRecord]) -> Option<Decimal> {
    rolling_average(history, FillRecord::positive_mileage, MILEAGE_SCALE)
}

/// Average of the latest positive prices, scale 2.
pub fn rolling_average_price(history: &[FillRecord]) -> Option<Decimal> {
    rolling_average(history, FillRecord::positive_price, PRICE_SCALE)
}

fn rolling_average(
    history: &[FillRecord],
    pick: fn(&FillRecord) -> Option<Decimal>,
    scale: u32,
) -> Option<Decimal> {
    let window: Vec<Decimal> = newest_first(history)
        .into_iter()
        .filter_map(pick)
        .take(ESTIMATION_WINDOW)
        .collect();

    math::mean_two_stage(&window, scale)
}
