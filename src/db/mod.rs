//! SQLite persistence for vehicles and fuel fills.
//!
//! [`init_db`] prepares the database; [`Repository`] is the `FuelLedger`
//! backed by it.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
