//! Read-only mileage and cost views for a vehicle.

use crate::domain::{UserId, VehicleId};
use crate::engine::stats;
use crate::engine::{LifetimeStats, MonthlyStats, OverviewStats, TrendPoint};
use crate::ledger::{FuelLedger, LedgerError};
use std::sync::Arc;

/// Checks ownership, loads the ascending history and hands it to
/// `engine::stats`. Holds no state of its own.
#[derive(Debug, Clone)]
pub struct StatsService {
    ledger: Arc<dyn FuelLedger>,
}

impl StatsService {
    pub fn new(ledger: Arc<dyn FuelLedger>) -> Self {
        Self { ledger }
    }

    pub async fn overview(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
    ) -> Result<OverviewStats, LedgerError> {
        self.ledger.validate_ownership(user, vehicle).await?;
        let history = self.ledger.list_history_ascending(vehicle).await?;
        Ok(stats::overview(&history))
    }

    pub async fn trend(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
    ) -> Result<Vec<TrendPoint>, LedgerError> {
        self.ledger.validate_ownership(user, vehicle).await?;
        let history = self.ledger.list_history_ascending(vehicle).await?;
        Ok(stats::trend(&history))
    }

    /// Monthly breakdown over fills dated within `year` only.
    pub async fn monthly(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
        year: i32,
    ) -> Result<MonthlyStats, LedgerError> {
        self.ledger.validate_ownership(user, vehicle).await?;
        let history = self
            .ledger
            .list_history_ascending_for_year(vehicle, year)
            .await?;
        Ok(stats::monthly(&history, year))
    }

    pub async fn lifetime(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
    ) -> Result<LifetimeStats, LedgerError> {
        self.ledger.validate_ownership(user, vehicle).await?;
        let history = self.ledger.list_history_ascending(vehicle).await?;
        Ok(stats::lifetime(&history))
    }
}
