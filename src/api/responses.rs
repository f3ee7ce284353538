//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{engine::Snapshot, error::AppError};

/// API response structure for countdown endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub countdown: Snapshot,
}

impl ApiResponse {
    /// Create a new API response; the status mirrors the countdown's run state
    pub fn new(message: impl Into<String>, countdown: Snapshot) -> Self {
        Self {
            status: countdown.run_state.as_str().to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            countdown,
        }
    }
}

/// Enhanced status response with server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub countdown: Snapshot,
    pub display: String,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body returned for any failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ZeroDuration => StatusCode::BAD_REQUEST,
            AppError::OutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StartRejected(_) => StatusCode::CONFLICT,
            AppError::StateLock(_) | AppError::Io(_) | AppError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
