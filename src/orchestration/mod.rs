//! Services that sequence ledger access around the pure engine.

pub mod fills;
pub mod locks;
pub mod stats;
pub mod vehicles;

pub use fills::{FillError, FillService};
pub use locks::VehicleLocks;
pub use stats::StatsService;
pub use vehicles::{VehicleError, VehicleService};
