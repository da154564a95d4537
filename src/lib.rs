pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{Decimal, FillRecord, MonthCode, UserId, Vehicle, VehicleId};
pub use error::AppError;
pub use ledger::{FuelLedger, LedgerError, MemoryLedger};
