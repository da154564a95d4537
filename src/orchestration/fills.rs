//! Fill creation and fill history listing.

use super::locks::VehicleLocks;
use crate::domain::{FillId, FillRecord, UserId, VehicleId};
use crate::engine::{
    EstimationEngine, EstimationError, FillRequest, MileageCalculator, OdometerCheck,
    OdometerPolicy,
};
use crate::ledger::{FuelLedger, LedgerError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FillError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Estimation(#[from] EstimationError),
    #[error("Odometer reading {reading} does not exceed the current odometer {current}")]
    NonIncreasingOdometer { reading: i64, current: i64 },
}

#[derive(Debug, Clone)]
pub struct FillService {
    ledger: Arc<dyn FuelLedger>,
    locks: Arc<VehicleLocks>,
    odometer_policy: OdometerPolicy,
}

impl FillService {
    pub fn new(ledger: Arc<dyn FuelLedger>, odometer_policy: OdometerPolicy) -> Self {
        Self {
            ledger,
            locks: Arc::new(VehicleLocks::new()),
            odometer_policy,
        }
    }

    /// Record a new fill for a vehicle owned by `user`.
    ///
    /// Runs under the vehicle's lock: ownership check, odometer policy,
    /// estimation of missing values against the existing history, derived
    /// metrics, insert, then the conditional odometer write. The odometer
    /// only advances after the fill is stored.
    pub async fn create_fill(
        &self,
        user: &UserId,
        request: FillRequest,
    ) -> Result<FillRecord, FillError> {
        let _guard = self.locks.acquire(request.vehicle_id).await;

        let vehicle = self
            .ledger
            .validate_ownership(user, &request.vehicle_id)
            .await?;

        if let OdometerCheck::NonIncreasing { current } =
            MileageCalculator::check_odometer(vehicle.current_odometer, request.odometer_reading)
        {
            match self.odometer_policy {
                OdometerPolicy::Accept => {}
                OdometerPolicy::Warn => warn!(
                    vehicle_id = %vehicle.id,
                    reading = request.odometer_reading,
                    current,
                    "Odometer reading does not advance the vehicle odometer"
                ),
                OdometerPolicy::Reject => {
                    return Err(FillError::NonIncreasingOdometer {
                        reading: request.odometer_reading,
                        current,
                    })
                }
            }
        }

        let history = self.ledger.list_history_ascending(&vehicle.id).await?;
        let resolved = EstimationEngine::resolve(&request, &history)?;
        if resolved.estimated {
            debug!(
                vehicle_id = %vehicle.id,
                fuel_volume = %resolved.fuel_volume,
                price_per_liter = %resolved.price_per_liter,
                volume_supplied = request.fuel_volume.is_some(),
                price_supplied = request.price_per_liter.is_some(),
                "Estimated missing fill values"
            );
        }

        let metrics = MileageCalculator::compute(
            &resolved,
            request.odometer_reading,
            request.fill_date,
            &history,
        );

        let now = Utc::now();
        let record = FillRecord {
            id: FillId::random(),
            vehicle_id: vehicle.id,
            user_id: *user,
            seq: 0,
            fill_date: request.fill_date,
            odometer_reading: request.odometer_reading,
            fuel_volume: Some(resolved.fuel_volume),
            price_per_liter: Some(resolved.price_per_liter),
            total_amount: metrics.total_amount,
            mileage: metrics.mileage,
            estimated: resolved.estimated,
            notes: request.notes,
            created_at: now,
        };

        let saved = self.ledger.save_fill_record(&record).await?;
        info!(
            vehicle_id = %saved.vehicle_id,
            fill_id = %saved.id,
            seq = saved.seq,
            total_amount = %saved.total_amount,
            estimated = saved.estimated,
            "Fill recorded"
        );

        if self
            .ledger
            .save_vehicle_odometer(&vehicle.id, saved.odometer_reading, now)
            .await?
        {
            info!(
                vehicle_id = %vehicle.id,
                odometer = saved.odometer_reading,
                "Vehicle odometer advanced"
            );
        }

        Ok(saved)
    }

    /// Fills of a vehicle owned by `user`, newest first.
    pub async fn history(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
    ) -> Result<Vec<FillRecord>, FillError> {
        self.ledger.validate_ownership(user, vehicle).await?;
        let mut fills = self.ledger.list_history_ascending(vehicle).await?;
        fills.reverse();
        Ok(fills)
    }

    /// Delete one fill of a vehicle owned by `user`.
    ///
    /// Mileage stored on the remaining fills and the vehicle odometer are
    /// left as they are.
    pub async fn delete_fill(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
        fill: &FillId,
    ) -> Result<(), FillError> {
        let _guard = self.locks.acquire(*vehicle).await;

        self.ledger.validate_ownership(user, vehicle).await?;
        if !self.ledger.delete_fill(vehicle, fill).await? {
            return Err(LedgerError::NotFound(format!("Fill {} not found", fill)).into());
        }
        info!(vehicle_id = %vehicle, fill_id = %fill, "Fill deleted");
        Ok(())
    }
}
