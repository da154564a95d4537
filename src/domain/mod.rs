//! Domain types and numeric policy for the fuel ledger.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - The shared rounding/scale policy in `math`
//! - Identifiers, month codes, fill and vehicle records
//! - Stable fill ordering helpers for deterministic processing

pub mod decimal;
pub mod fill;
pub mod math;
pub mod ordering;
pub mod primitives;
pub mod vehicle;

pub use decimal::Decimal;
pub use fill::FillRecord;
pub use ordering::FillOrderingKey;
pub use primitives::{FillId, MonthCode, UserId, VehicleId};
pub use vehicle::{Vehicle, VehicleDetails, VehicleUpdate};
