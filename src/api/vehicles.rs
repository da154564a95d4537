use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{format_timestamp, parse_vehicle_id, user_from_headers, AppState};
use crate::domain::{Vehicle, VehicleDetails, VehicleUpdate};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleBody {
    pub nickname: Option<String>,
    pub registration_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub initial_odometer: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: String,
    pub nickname: Option<String>,
    pub registration_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub initial_odometer: Option<i64>,
    pub current_odometer: Option<i64>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id.to_string(),
            nickname: vehicle.details.nickname,
            registration_number: vehicle.details.registration_number,
            make: vehicle.details.make,
            model: vehicle.details.model,
            initial_odometer: vehicle.initial_odometer,
            current_odometer: vehicle.current_odometer,
            created_at: format_timestamp(vehicle.created_at),
            updated_at: vehicle.updated_at.map(format_timestamp),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VehicleListResponse {
    pub vehicles: Vec<VehicleResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleBody {
    pub nickname: Option<String>,
    pub registration_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub current_odometer: Option<i64>,
}

const NAME_MAX_CHARS: usize = 100;
const REGISTRATION_MAX_CHARS: usize = 50;

/// Trim a text field; blank input counts as absent.
fn clean(
    field: Option<String>,
    name: &str,
    max_chars: usize,
) -> Result<Option<String>, AppError> {
    let Some(value) = field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max_chars {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            name, max_chars
        )));
    }
    Ok(Some(value))
}

fn details_from(
    nickname: Option<String>,
    registration_number: Option<String>,
    make: Option<String>,
    model: Option<String>,
) -> Result<VehicleDetails, AppError> {
    Ok(VehicleDetails {
        nickname: clean(nickname, "nickname", NAME_MAX_CHARS)?,
        registration_number: clean(
            registration_number,
            "registrationNumber",
            REGISTRATION_MAX_CHARS,
        )?,
        make: clean(make, "make", NAME_MAX_CHARS)?,
        model: clean(model, "model", NAME_MAX_CHARS)?,
    })
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateVehicleBody>, JsonRejection>,
) -> Result<(StatusCode, Json<VehicleResponse>), AppError> {
    let user = user_from_headers(&headers)?;
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if matches!(body.initial_odometer, Some(reading) if reading < 0) {
        return Err(AppError::BadRequest(
            "initialOdometer must be >= 0".to_string(),
        ));
    }

    let details = details_from(
        body.nickname,
        body.registration_number,
        body.make,
        body.model,
    )?;

    let vehicle = state
        .vehicles
        .register(&user, details, body.initial_odometer)
        .await?;

    Ok((StatusCode::CREATED, Json(vehicle.into())))
}

pub async fn list_vehicles(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VehicleListResponse>, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicles = state.vehicles.list(&user).await?;

    Ok(Json(VehicleListResponse {
        vehicles: vehicles.into_iter().map(VehicleResponse::from).collect(),
    }))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<VehicleResponse>, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let vehicle = state.vehicles.get(&user, &vehicle_id).await?;

    Ok(Json(vehicle.into()))
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
    body: Result<Json<UpdateVehicleBody>, JsonRejection>,
) -> Result<Json<VehicleResponse>, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if matches!(body.current_odometer, Some(reading) if reading < 0) {
        return Err(AppError::BadRequest(
            "currentOdometer must be >= 0".to_string(),
        ));
    }

    let update = VehicleUpdate {
        details: details_from(
            body.nickname,
            body.registration_number,
            body.make,
            body.model,
        )?,
        current_odometer: body.current_odometer,
    };
    let vehicle = state.vehicles.update(&user, &vehicle_id, update).await?;

    Ok(Json(vehicle.into()))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = user_from_headers(&headers)?;
    let vehicle_id = parse_vehicle_id(&vehicle_id)?;
    state.vehicles.delete(&user, &vehicle_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
