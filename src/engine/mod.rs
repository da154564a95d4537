//! Pure computation engine(s) for fill estimation and mileage analytics.

pub mod estimation;
pub mod mileage;
pub mod stats;

pub use estimation::{EstimationEngine, EstimationError, FillRequest, ResolvedFill, ESTIMATION_WINDOW};
pub use mileage::{
    FillMetrics, MileageCalculator, OdometerCheck, OdometerPolicy, DEFAULT_ODOMETER_POLICY,
};
pub use stats::{LifetimeStats, MonthlyBucket, MonthlyStats, OverviewStats, TrendPoint};
