use std::io::Error as IoError;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use pagewatch_service::MonitorError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Startup failed: {0:#}")]
    Startup(#[from] anyhow::Error),
}

/// Errors surfaced by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Monitor(MonitorError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Monitor(MonitorError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Monitor(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Unauthorized => json!({ "error": "Unauthorized" }),
            ApiError::Monitor(error) => json!({ "success": false, "error": error.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
