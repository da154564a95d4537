//! Fill record representing a single refueling event.

use crate::domain::{Decimal, FillId, UserId, VehicleId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A persisted fuel fill.
///
/// Immutable once saved. `total_amount` and `mileage` are always derived at
/// creation time and never supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRecord {
    pub id: FillId,
    pub vehicle_id: VehicleId,
    /// Owner of the vehicle when the fill was recorded.
    pub user_id: UserId,
    /// Insertion sequence assigned by the ledger; breaks same-date ties.
    /// Zero until the record is saved.
    pub seq: i64,
    pub fill_date: NaiveDate,
    pub odometer_reading: i64,
    /// Liters.
    pub fuel_volume: Option<Decimal>,
    /// Currency per liter.
    pub price_per_liter: Option<Decimal>,
    /// `fuel_volume * price_per_liter`, scale 2.
    pub total_amount: Decimal,
    /// Distance per liter relative to the previous fill, scale 3.
    pub mileage: Option<Decimal>,
    /// True when volume or price was derived rather than supplied.
    pub estimated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FillRecord {
    /// Volume with a missing value read as zero.
    pub fn fuel_volume_or_zero(&self) -> Decimal {
        self.fuel_volume.unwrap_or_default()
    }

    /// Returns the stored mileage only when it is strictly positive.
    pub fn positive_mileage(&self) -> Option<Decimal> {
        self.mileage.filter(Decimal::is_positive)
    }

    /// Returns the stored price only when it is strictly positive.
    pub fn positive_price(&self) -> Option<Decimal> {
        self.price_per_liter.filter(Decimal::is_positive)
    }
}
