use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use rusqlite::ErrorCode;

use crate::models::BookingStatus;

/// Failures raised by the scheduling engine. Overlap is not here: it is a
/// `ProposalOutcome::Rejected`, not a fault.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid time: {0}")]
    InvalidTimeFormat(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("resource {resource_id} is unavailable on {date}")]
    ResourceUnavailable { resource_id: String, date: NaiveDate },

    #[error("booking not found: {0}")]
    BookingNotFound(String),

    #[error("booking {id} is {status} and can no longer change")]
    InvalidTransition { id: String, status: BookingStatus },

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("unknown add-on: {0}")]
    UnknownAddon(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("transient failure, retry: {0}")]
    Transient(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transient(_))
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                EngineError::Transient(e.to_string())
            }
            _ => EngineError::Database(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Engine(e) => match e {
                EngineError::InvalidTimeFormat(_)
                | EngineError::InvalidDuration(_)
                | EngineError::UnknownService(_)
                | EngineError::UnknownAddon(_) => StatusCode::BAD_REQUEST,
                EngineError::ResourceNotFound(_)
                | EngineError::BookingNotFound(_)
                | EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                EngineError::ResourceUnavailable { .. } | EngineError::InvalidTransition { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                EngineError::Unauthorized => StatusCode::FORBIDDEN,
                EngineError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
                EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
        };

        let retryable = matches!(&self, AppError::Engine(e) if e.is_retryable());
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string(), "retryable": retryable });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_errors_map_to_client_or_transient_statuses() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (
                AppError::Engine(EngineError::Transient("busy".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Engine(EngineError::BookingNotFound("b-1".into())),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
