//! In-process ledger for tests and local experiments.

use super::{ensure_owner, year_bounds, FuelLedger, LedgerError};
use crate::domain::ordering::sort_fills_deterministic;
use crate::domain::{FillId, FillRecord, UserId, Vehicle, VehicleDetails, VehicleId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    vehicles: HashMap<VehicleId, Vehicle>,
    fills: Vec<FillRecord>,
    last_seq: i64,
}

/// Ledger backed by in-memory collections.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<MemoryState>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vehicle to the ledger.
    pub fn with_vehicle(self, vehicle: Vehicle) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.vehicles.insert(vehicle.id, vehicle);
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Io("memory ledger lock poisoned".to_string()))
    }

    fn live_vehicle<'a>(
        state: &'a mut MemoryState,
        vehicle: &VehicleId,
    ) -> Result<&'a mut Vehicle, LedgerError> {
        state
            .vehicles
            .get_mut(vehicle)
            .filter(|v| !v.deleted)
            .ok_or_else(|| LedgerError::NotFound(format!("Vehicle {} not found", vehicle)))
    }

    fn history_where<F>(&self, vehicle: &VehicleId, keep: F) -> Result<Vec<FillRecord>, LedgerError>
    where
        F: Fn(&FillRecord) -> bool,
    {
        let state = self.lock()?;
        let mut fills: Vec<FillRecord> = state
            .fills
            .iter()
            .filter(|f| f.vehicle_id == *vehicle && keep(f))
            .cloned()
            .collect();
        sort_fills_deterministic(&mut fills);
        Ok(fills)
    }
}

#[async_trait]
impl FuelLedger for MemoryLedger {
    async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<(), LedgerError> {
        self.lock()?.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn list_vehicles(&self, owner: &UserId) -> Result<Vec<Vehicle>, LedgerError> {
        let state = self.lock()?;
        let mut vehicles: Vec<Vehicle> = state
            .vehicles
            .values()
            .filter(|v| v.is_owned_by(owner) && !v.deleted)
            .cloned()
            .collect();
        vehicles.sort_by_key(|v| (v.created_at, v.id));
        Ok(vehicles)
    }

    async fn validate_ownership(
        &self,
        user: &UserId,
        vehicle: &VehicleId,
    ) -> Result<Vehicle, LedgerError> {
        let found = self.lock()?.vehicles.get(vehicle).cloned();
        ensure_owner(found, user, vehicle)
    }

    async fn list_history_ascending(
        &self,
        vehicle: &VehicleId,
    ) -> Result<Vec<FillRecord>, LedgerError> {
        self.history_where(vehicle, |_| true)
    }

    async fn list_history_ascending_for_year(
        &self,
        vehicle: &VehicleId,
        year: i32,
    ) -> Result<Vec<FillRecord>, LedgerError> {
        let Some((from, to)) = year_bounds(year) else {
            return Ok(Vec::new());
        };
        self.history_where(vehicle, |f| f.fill_date >= from && f.fill_date <= to)
    }

    async fn save_fill_record(&self, record: &FillRecord) -> Result<FillRecord, LedgerError> {
        let mut state = self.lock()?;
        if !state.vehicles.contains_key(&record.vehicle_id) {
            return Err(LedgerError::NotFound(format!(
                "Vehicle {} not found",
                record.vehicle_id
            )));
        }
        state.last_seq += 1;
        let saved = FillRecord {
            seq: state.last_seq,
            ..record.clone()
        };
        state.fills.push(saved.clone());
        Ok(saved)
    }

    async fn save_vehicle_odometer(
        &self,
        vehicle: &VehicleId,
        reading: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let mut state = self.lock()?;
        let stored = Self::live_vehicle(&mut state, vehicle)?;
        Ok(stored.apply_ratchet(reading, at))
    }

    async fn save_vehicle_details(
        &self,
        vehicle: &VehicleId,
        details: &VehicleDetails,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        let stored = Self::live_vehicle(&mut state, vehicle)?;
        stored.details = details.clone();
        stored.updated_at = Some(at);
        Ok(())
    }

    async fn soft_delete_vehicle(
        &self,
        vehicle: &VehicleId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        let stored = Self::live_vehicle(&mut state, vehicle)?;
        stored.deleted = true;
        stored.updated_at = Some(at);
        Ok(())
    }

    async fn delete_fill(&self, vehicle: &VehicleId, fill: &FillId) -> Result<bool, LedgerError> {
        let mut state = self.lock()?;
        let before = state.fills.len();
        state
            .fills
            .retain(|f| !(f.vehicle_id == *vehicle && f.id == *fill));
        Ok(state.fills.len() < before)
    }
}
