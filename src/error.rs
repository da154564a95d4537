use crate::config::ConfigError;
use crate::engine::EstimationError;
use crate::ledger::LedgerError;
use crate::orchestration::{FillError, VehicleError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP layer and the server bootstrap.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// The message sent to clients, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            AppError::Config(msg)
            | AppError::Internal(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::InsufficientData(msg)
            | AppError::Conflict(msg) => msg,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(msg) => AppError::NotFound(msg),
            LedgerError::Forbidden(msg) => AppError::Forbidden(msg),
            LedgerError::Io(msg) => AppError::Internal(msg),
        }
    }
}

impl From<EstimationError> for AppError {
    fn from(err: EstimationError) -> Self {
        match err {
            EstimationError::InsufficientData { .. } => AppError::InsufficientData(err.to_string()),
            EstimationError::NonPositive { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<FillError> for AppError {
    fn from(err: FillError) -> Self {
        match err {
            FillError::Ledger(e) => e.into(),
            FillError::Estimation(e) => e.into(),
            e @ FillError::NonIncreasingOdometer { .. } => AppError::Conflict(e.to_string()),
        }
    }
}

impl From<VehicleError> for AppError {
    fn from(err: VehicleError) -> Self {
        match err {
            VehicleError::Ledger(e) => e.into(),
            e @ VehicleError::NonIncreasingOdometer { .. } => AppError::Conflict(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
