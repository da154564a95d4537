use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::api::{parse_vehicle_id, user_from_headers, AppState};
use crate::engine::LifetimeStats;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_fuel: String,
    pub total_cost: String,
    pub total_distance: i64,
    pub average_mileage: Option<String>,
    pub cost_per_km: Option<String>,
}

impl From<LifetimeStats> for StatsResponse {
    fn from(stats: LifetimeStats) -> Self {
        Self {
            total_fuel: stats.total_fuel.to_scaled_string(),
            total_cost: stats.total_cost.to_scaled_string(),
            total_distance: stats.total_distance,
            average_mileage: stats.average_mileage.map(|d| d.to_scaled_string()),
            cost_per_km: stats.cost_per_km.map(|d| d.to_scaled_string()),
        }
    }
}

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let lifetime = state.stats.lifetime(&user, &vehicle_id).await?;

    Ok(Json(lifetime.into()))
}
