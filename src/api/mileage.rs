use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::api::{parse_vehicle_id, user_from_headers, AppState};
use crate::domain::MonthCode;
use crate::engine::{MonthlyBucket, MonthlyStats, OverviewStats, TrendPoint};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub last_fill_mileage: String,
    pub average_mileage: String,
    pub best_mileage: String,
    pub worst_mileage: String,
    pub total_distance: i64,
    pub total_fills: usize,
}

impl From<OverviewStats> for OverviewResponse {
    fn from(stats: OverviewStats) -> Self {
        Self {
            last_fill_mileage: stats.last_fill_mileage.to_scaled_string(),
            average_mileage: stats.average_mileage.to_scaled_string(),
            best_mileage: stats.best_mileage.to_scaled_string(),
            worst_mileage: stats.worst_mileage.to_scaled_string(),
            total_distance: stats.total_distance,
            total_fills: stats.total_fills,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPointResponse {
    pub fill_date: String,
    pub mileage: String,
}

impl From<TrendPoint> for TrendPointResponse {
    fn from(point: TrendPoint) -> Self {
        Self {
            fill_date: point.date.format("%Y-%m-%d").to_string(),
            mileage: point.mileage.to_scaled_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub trend: Vec<TrendPointResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucketResponse {
    pub avg_mileage: String,
    pub distance_travelled: i64,
    pub fuel_consumed: String,
}

impl From<MonthlyBucket> for MonthlyBucketResponse {
    fn from(bucket: MonthlyBucket) -> Self {
        Self {
            avg_mileage: bucket.avg_mileage.to_scaled_string(),
            distance_travelled: bucket.distance_travelled,
            fuel_consumed: bucket.fuel_consumed.to_scaled_string(),
        }
    }
}

/// Month buckets keyed by month code, serialized JAN through DEC.
#[derive(Debug)]
pub struct MonthlyData(pub Vec<(MonthCode, MonthlyBucketResponse)>);

impl Serialize for MonthlyData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (month, bucket) in &self.0 {
            map.serialize_entry(month.as_str(), bucket)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct MonthlyResponse {
    pub year: i32,
    pub data: MonthlyData,
}

impl From<MonthlyStats> for MonthlyResponse {
    fn from(stats: MonthlyStats) -> Self {
        Self {
            year: stats.year,
            data: MonthlyData(
                stats
                    .months
                    .into_iter()
                    .map(|(month, bucket)| (month, bucket.into()))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub year: i32,
}

pub async fn get_overview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<OverviewResponse>, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let overview = state.stats.overview(&user, &vehicle_id).await?;

    Ok(Json(overview.into()))
}

pub async fn get_trend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<TrendResponse>, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let points = state.stats.trend(&user, &vehicle_id).await?;

    Ok(Json(TrendResponse {
        trend: points.into_iter().map(TrendPointResponse::from).collect(),
    }))
}

pub async fn get_monthly(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
    query: Result<Query<MonthlyQuery>, QueryRejection>,
) -> Result<Json<MonthlyResponse>, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let Query(params) =
        query.map_err(|_| AppError::BadRequest("year must be a valid integer".to_string()))?;

    let monthly = state.stats.monthly(&user, &vehicle_id, params.year).await?;

    Ok(Json(monthly.into()))
}
