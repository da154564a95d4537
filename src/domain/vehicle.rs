//! Vehicle record and the odometer ratchet.

use crate::domain::{UserId, VehicleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive, user-editable vehicle fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDetails {
    pub nickname: Option<String>,
    pub registration_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
}

impl VehicleDetails {
    /// Overlay `changes` on these details; fields absent from `changes` keep
    /// their current value.
    pub fn merge(self, changes: VehicleDetails) -> VehicleDetails {
        VehicleDetails {
            nickname: changes.nickname.or(self.nickname),
            registration_number: changes.registration_number.or(self.registration_number),
            make: changes.make.or(self.make),
            model: changes.model.or(self.model),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == VehicleDetails::default()
    }
}

/// Partial update of a vehicle. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleUpdate {
    pub details: VehicleDetails,
    /// Moved through the ratchet, so it can only advance the odometer.
    pub current_odometer: Option<i64>,
}

/// A vehicle owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub owner_id: UserId,
    pub details: VehicleDetails,
    pub initial_odometer: Option<i64>,
    /// Highest odometer reading seen so far. Only ever moves forward.
    pub current_odometer: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-deleted vehicles are hidden from every owner lookup.
    pub deleted: bool,
}

impl Vehicle {
    /// Register a new vehicle; the current odometer starts at the initial reading.
    pub fn register(
        owner_id: UserId,
        details: VehicleDetails,
        initial_odometer: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: VehicleId::random(),
            owner_id,
            details,
            initial_odometer,
            current_odometer: initial_odometer,
            created_at: now,
            updated_at: None,
            deleted: false,
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id == *user
    }

    /// Move `current_odometer` to `reading` if it is strictly greater.
    ///
    /// Returns true when the vehicle changed.
    pub fn apply_ratchet(&mut self, reading: i64, now: DateTime<Utc>) -> bool {
        if !odometer_advances(self.current_odometer, reading) {
            return false;
        }
        self.current_odometer = Some(reading);
        self.updated_at = Some(now);
        true
    }
}

/// Ratchet rule: an unset odometer always advances, otherwise only a strictly
/// greater reading does. Equal and lower readings are treated alike.
pub fn odometer_advances(current: Option<i64>, reading: i64) -> bool {
    match current {
        None => true,
        Some(current) => reading > current,
    }
}
