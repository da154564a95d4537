use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::{format_timestamp, parse_fill_id, parse_vehicle_id, user_from_headers, AppState};
use crate::domain::{Decimal, FillRecord, VehicleId};
use crate::engine::FillRequest;
use crate::error::AppError;

/// A decimal field sent either as a JSON string or a JSON number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DecimalInput {
    Text(String),
    Number(serde_json::Number),
}

impl DecimalInput {
    fn parse(&self, field: &str) -> Result<Decimal, AppError> {
        let raw = match self {
            DecimalInput::Text(s) => s.clone(),
            DecimalInput::Number(n) => n.to_string(),
        };
        Decimal::from_str_canonical(&raw)
            .map_err(|_| AppError::BadRequest(format!("Invalid {}", field)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFillBody {
    pub fill_date: String,
    pub odometer_reading: i64,
    pub fuel_volume: Option<DecimalInput>,
    pub price_per_liter: Option<DecimalInput>,
    pub notes: Option<String>,
}

impl CreateFillBody {
    fn into_request(self, vehicle_id: VehicleId) -> Result<FillRequest, AppError> {
        let fill_date = NaiveDate::parse_from_str(self.fill_date.trim(), "%Y-%m-%d")
            .ok()
            .filter(|date| (0..=9999).contains(&date.year()))
            .ok_or_else(|| AppError::BadRequest("fillDate must be YYYY-MM-DD".to_string()))?;

        if self.odometer_reading < 0 {
            return Err(AppError::BadRequest(
                "odometerReading must be >= 0".to_string(),
            ));
        }

        let fuel_volume = positive(self.fuel_volume.as_ref(), "fuelVolume")?;
        let price_per_liter = positive(self.price_per_liter.as_ref(), "pricePerLiter")?;

        Ok(FillRequest {
            vehicle_id,
            fill_date,
            odometer_reading: self.odometer_reading,
            fuel_volume,
            price_per_liter,
            notes: self
                .notes
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

fn positive(input: Option<&DecimalInput>, field: &str) -> Result<Option<Decimal>, AppError> {
    let Some(input) = input else {
        return Ok(None);
    };
    let value = input.parse(field)?;
    if !value.is_positive() {
        return Err(AppError::BadRequest(format!("{} must be > 0", field)));
    }
    Ok(Some(value))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResponse {
    pub id: String,
    pub vehicle_id: String,
    pub fill_date: String,
    pub odometer_reading: i64,
    pub fuel_volume: Option<String>,
    pub price_per_liter: Option<String>,
    pub total_amount: String,
    pub mileage: Option<String>,
    pub estimated: bool,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<FillRecord> for FillResponse {
    fn from(fill: FillRecord) -> Self {
        Self {
            id: fill.id.to_string(),
            vehicle_id: fill.vehicle_id.to_string(),
            fill_date: fill.fill_date.format("%Y-%m-%d").to_string(),
            odometer_reading: fill.odometer_reading,
            fuel_volume: fill.fuel_volume.map(|d| d.to_scaled_string()),
            price_per_liter: fill.price_per_liter.map(|d| d.to_scaled_string()),
            total_amount: fill.total_amount.to_scaled_string(),
            mileage: fill.mileage.map(|d| d.to_scaled_string()),
            estimated: fill.estimated,
            notes: fill.notes,
            created_at: format_timestamp(fill.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FillListResponse {
    pub fills: Vec<FillResponse>,
}

pub async fn create_fill(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
    body: Result<Json<CreateFillBody>, JsonRejection>,
) -> Result<(StatusCode, Json<FillResponse>), AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = body.into_request(vehicle_id)?;

    let fill = state.fills.create_fill(&user, request).await?;

    Ok((StatusCode::CREATED, Json(fill.into())))
}

pub async fn list_fills(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<FillListResponse>, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let fills = state.fills.history(&user, &vehicle_id).await?;

    Ok(Json(FillListResponse {
        fills: fills.into_iter().map(FillResponse::from).collect(),
    }))
}

pub async fn delete_fill(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((vehicle_id, fill_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let fill_id = parse_fill_id(&fill_id)?;
    state.fills.delete_fill(&user, &vehicle_id, &fill_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
