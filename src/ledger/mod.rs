//! Storage seam for vehicles and fill history.
//!
//! The analytics core only talks to a [`FuelLedger`]; the SQLite
//! [`Repository`](crate::db::Repository) and the in-process [`MemoryLedger`]
//! both implement it.

use crate::domain::{FillId, FillRecord, UserId, Vehicle, VehicleDetails, VehicleId};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryLedger;

/// Persistence operations the fill and stats services depend on.
#[async_trait]
pub trait FuelLedger: Send + Sync + fmt::Debug {
    /// Store a newly registered vehicle.
    async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<(), LedgerError>;

    /// Non-deleted vehicles owned by `owner`, oldest first.
    async fn list_vehicles(&self, owner: &UserId) -> Result<Vec<Vehicle>, LedgerError>;

    /// Load a vehicle and check that `user` owns it.
    ///
    /// # Errors
    /// `NotFound` if the vehicle does not exist or was deleted, `Forbidden` if
    /// another user owns it.
    async fn validate_ownership(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
    ) -> Result<Vehicle, LedgerError>;

    /// All fills of a vehicle ordered by `(fill_date, seq)`.
    async fn list_history_ascending(
        &self,
        vehicle: &VehicleId,
    ) -> Result<Vec<FillRecord>, LedgerError>;

    /// Fills of a vehicle dated within `year`, ordered by `(fill_date, seq)`.
    async fn list_history_ascending_for_year(
        &self,
        vehicle: &VehicleId,
        year: i32,
    ) -> Result<Vec<FillRecord>, LedgerError>;

    /// Insert a fill; the returned copy carries its assigned `seq`.
    async fn save_fill_record(&self, record: &FillRecord) -> Result<FillRecord, LedgerError>;

    /// Conditionally advance a vehicle's odometer.
    ///
    /// Writes only when the stored odometer is unset or lower than `reading`;
    /// returns whether a write happened.
    async fn save_vehicle_odometer(
        &self,
        vehicle: &VehicleId,
        reading: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, LedgerError>;

    /// Replace a vehicle's descriptive fields and stamp `updated_at`.
    async fn save_vehicle_details(
        &self,
        vehicle: &VehicleId,
        details: &VehicleDetails,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Mark a vehicle deleted. Its fills are kept but no longer reachable.
    async fn soft_delete_vehicle(
        &self,
        vehicle: &VehicleId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Remove one fill of `vehicle`; returns whether it existed.
    async fn delete_fill(&self, vehicle: &VehicleId, fill: &FillId) -> Result<bool, LedgerError>;
}

/// Error type for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Storage error: {0}")]
    Io(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

/// Apply the ownership rule to a looked-up vehicle.
pub fn ensure_owner(
    vehicle: Option<Vehicle>,
    user: &UserId,
    vehicle_id: &VehicleId,
) -> Result<Vehicle, LedgerError> {
    match vehicle.filter(|v| !v.deleted) {
        None => Err(LedgerError::NotFound(format!("Vehicle {} not found", vehicle_id))),
        Some(v) if !v.is_owned_by(user) => Err(LedgerError::Forbidden(format!(
            "Vehicle {} is not accessible",
            vehicle_id
        ))),
        Some(v) => Ok(v),
    }
}

/// First and last calendar day of `year`.
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}
