pub mod fills;
pub mod health;
pub mod mileage;
pub mod stats;
pub mod vehicles;

use crate::config::Config;
use crate::domain::{FillId, UserId, VehicleId};
use crate::error::AppError;
use crate::ledger::FuelLedger;
use crate::orchestration::{FillService, StatsService, VehicleService};
use axum::http::HeaderMap;
use axum::{
    routing::{delete, get},
    Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Header carrying the authenticated caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub vehicles: Arc<VehicleService>,
    pub fills: Arc<FillService>,
    pub stats: Arc<StatsService>,
}

impl AppState {
    pub fn new(ledger: Arc<dyn FuelLedger>, config: Config) -> Self {
        Self {
            vehicles: Arc::new(VehicleService::new(ledger.clone())),
            fills: Arc::new(FillService::new(ledger.clone(), config.odometer_policy)),
            stats: Arc::new(StatsService::new(ledger)),
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/vehicles",
            get(vehicles::list_vehicles).post(vehicles::create_vehicle),
        )
        .route(
            "/v1/vehicles/:vehicle_id",
            get(vehicles::get_vehicle)
                .put(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        .route(
            "/v1/vehicles/:vehicle_id/fills",
            get(fills::list_fills).post(fills::create_fill),
        )
        .route(
            "/v1/vehicles/:vehicle_id/fills/:fill_id",
            delete(fills::delete_fill),
        )
        .route(
            "/v1/vehicles/:vehicle_id/mileage/overview",
            get(mileage::get_overview),
        )
        .route("/v1/vehicles/:vehicle_id/mileage/trend", get(mileage::get_trend))
        .route(
            "/v1/vehicles/:vehicle_id/mileage/monthly",
            get(mileage::get_monthly),
        )
        .route("/v1/vehicles/:vehicle_id/stats", get(stats::get_stats))
        .layer(cors)
        .with_state(state)
}

/// Resolve the caller from the `X-User-Id` header.
fn user_from_headers(headers: &HeaderMap) -> Result<UserId, AppError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?;
    raw.to_str()
        .ok()
        .and_then(|s| s.parse::<UserId>().ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid X-User-Id header".to_string()))
}

fn parse_vehicle_id(input: &str) -> Result<VehicleId, AppError> {
    input
        .parse::<VehicleId>()
        .map_err(|_| AppError::BadRequest("Invalid vehicle id".to_string()))
}

fn parse_fill_id(input: &str) -> Result<FillId, AppError> {
    input
        .parse::<FillId>()
        .map_err(|_| AppError::BadRequest("Invalid fill id".to_string()))
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
