//! API error handling
//!
//! Maps service errors onto HTTP status codes with a JSON error body.

use aq_core::error::{AqError, ValidationErrors};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound { resource: &'static str, id: String },
    Validation(ValidationErrors),
    BadRequest(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound { resource, id: id.to_string() }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::Validation(_) => "validation_failed",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::BadGateway(_) => "external_service_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<AqError> for ApiError {
    fn from(err: AqError) -> Self {
        match err {
            AqError::NotFound { entity, value, .. } => ApiError::NotFound { resource: entity, id: value },
            AqError::Validation(errors) => ApiError::Validation(errors),
            AqError::Conflict { message } => ApiError::Conflict(message),
            AqError::ExternalService { service, message } => {
                ApiError::BadGateway(format!("{service}: {message}"))
            }
            other @ (AqError::Internal(_) | AqError::Config(_)) => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, details) = match &self {
            ApiError::NotFound { resource, id } => (format!("{resource} with id {id} not found"), Vec::new()),
            ApiError::Validation(errors) => {
                let details = errors.full_messages();
                (details.join(", "), details)
            }
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => (msg.clone(), Vec::new()),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), %message, "Request failed");
        }

        let body = ErrorBody {
            error: self.error_code(),
            message,
            details,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
