//! Vehicle registration, lookup, editing and soft deletion.

use crate::domain::vehicle::odometer_advances;
use crate::domain::{UserId, Vehicle, VehicleDetails, VehicleId, VehicleUpdate};
use crate::ledger::{FuelLedger, LedgerError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum VehicleError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("currentOdometer {reading} does not exceed the current odometer {current}")]
    NonIncreasingOdometer { reading: i64, current: i64 },
}

#[derive(Debug, Clone)]
pub struct VehicleService {
    ledger: Arc<dyn FuelLedger>,
}

impl VehicleService {
    pub fn new(ledger: Arc<dyn FuelLedger>) -> Self {
        Self { ledger }
    }

    /// Register a vehicle for `owner`. The current odometer starts at the
    /// initial reading.
    pub async fn register(
        &self,
        owner: &UserId,
        details: VehicleDetails,
        initial_odometer: Option<i64>,
    ) -> Result<Vehicle, LedgerError> {
        let vehicle = Vehicle::register(*owner, details, initial_odometer, now_millis());
        self.ledger.create_vehicle(&vehicle).await?;
        info!(vehicle_id = %vehicle.id, owner_id = %owner, "Vehicle registered");
        Ok(vehicle)
    }

    pub async fn list(&self, owner: &UserId) -> Result<Vec<Vehicle>, LedgerError> {
        self.ledger.list_vehicles(owner).await
    }

    pub async fn get(&self, user: &UserId, vehicle: &VehicleId) -> Result<Vehicle, LedgerError> {
        self.ledger.validate_ownership(user, vehicle).await
    }

    /// Apply a partial update to a vehicle owned by `user`.
    ///
    /// A new odometer value goes through the ratchet: a reading that does not
    /// exceed the current odometer is a conflict and nothing is written.
    pub async fn update(
        &self,
        user: &UserId,
        id: &VehicleId,
        update: VehicleUpdate,
    ) -> Result<Vehicle, VehicleError> {
        let vehicle = self.ledger.validate_ownership(user, id).await?;
        let now = now_millis();

        if let Some(reading) = update.current_odometer {
            let conflict = VehicleError::NonIncreasingOdometer {
                reading,
                current: vehicle.current_odometer.unwrap_or_default(),
            };
            if !odometer_advances(vehicle.current_odometer, reading) {
                return Err(conflict);
            }
            // A concurrent fill may have moved the odometer past `reading`.
            if !self.ledger.save_vehicle_odometer(id, reading, now).await? {
                return Err(conflict);
            }
        }

        if !update.details.is_empty() {
            let details = vehicle.details.merge(update.details);
            self.ledger.save_vehicle_details(id, &details, now).await?;
        }

        let updated = self.ledger.validate_ownership(user, id).await?;
        info!(vehicle_id = %id, owner_id = %user, "Vehicle updated");
        Ok(updated)
    }

    /// Soft-delete a vehicle owned by `user`. Its fills are kept but can no
    /// longer be reached.
    pub async fn delete(&self, user: &UserId, id: &VehicleId) -> Result<(), LedgerError> {
        self.ledger.validate_ownership(user, id).await?;
        self.ledger.soft_delete_vehicle(id, now_millis()).await?;
        info!(vehicle_id = %id, owner_id = %user, "Vehicle deleted");
        Ok(())
    }
}

/// Current time at the millisecond precision the ledger stores.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
