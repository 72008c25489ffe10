use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::error::AdhkarError;

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    ExternalApiError { service: String, message: String },

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::ExternalApiError { service, message } => {
                write!(f, "{} error: {}", service, message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::ExternalApiError { service, message } => {
                log::warn!("{} error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("{} is unavailable", service),
                )
            }
            ApiError::InternalError(msg) => {
                log::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

impl From<AdhkarError> for ApiError {
    fn from(err: AdhkarError) -> Self {
        match err {
            AdhkarError::InvalidSetting { .. } | AdhkarError::IncompleteLocation => {
                ApiError::ValidationError(err.to_string())
            }
            AdhkarError::Network { service, .. } | AdhkarError::UpstreamStatus { service, .. } => {
                ApiError::ExternalApiError {
                    service: service.to_string(),
                    message: err.to_string(),
                }
            }
            AdhkarError::Decode { .. } => ApiError::ExternalApiError {
                service: "geo API".to_string(),
                message: err.to_string(),
            },
            AdhkarError::MissingApiKey => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}
