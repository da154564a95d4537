//! Per-vehicle serialization of fill creation.

use crate::domain::VehicleId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per vehicle.
///
/// Holding the guard for a vehicle makes the read-history, compute, write
/// sequence atomic with respect to other fills for the same vehicle. Fills for
/// different vehicles do not contend. Entries nobody holds or waits on are
/// dropped on the next acquire, so the map stays as large as the set of
/// vehicles currently being written.
#[derive(Debug, Default)]
pub struct VehicleLocks {
    locks: Mutex<HashMap<VehicleId, Arc<Mutex<()>>>>,
}

impl VehicleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `vehicle`.
    pub async fn acquire(&self, vehicle: VehicleId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the map holds an idle entry; holders and waiters keep a clone.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(vehicle).or_default().clone()
        };
        lock.lock_owned().await
    }
}
