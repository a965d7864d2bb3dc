use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::state::engine::MatchError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<MatchError> for ServiceError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::ServeLocked | MatchError::ServeSideNotAllowed { .. } => {
                ServiceError::InvalidState(err.to_string())
            }
            MatchError::DuplicatePlayer(_) => ServiceError::InvalidState(err.to_string()),
            MatchError::BlankName => ServiceError::InvalidInput(err.to_string()),
            MatchError::UnknownPlayer(_) | MatchError::UnknownSet(_) => {
                ServiceError::NotFound(err.to_string())
            }
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::model::Side;

    #[test]
    fn engine_rejections_map_to_http_statuses() {
        let cases = [
            (MatchError::ServeLocked, StatusCode::CONFLICT),
            (
                MatchError::ServeSideNotAllowed {
                    side: Side::B,
                    winner: Side::A,
                },
                StatusCode::CONFLICT,
            ),
            (MatchError::DuplicatePlayer("Ada".into()), StatusCode::CONFLICT),
            (MatchError::UnknownPlayer("Bo".into()), StatusCode::NOT_FOUND),
            (MatchError::BlankName, StatusCode::BAD_REQUEST),
            (MatchError::UnknownSet(4), StatusCode::NOT_FOUND),
        ];

        for (err, status) in cases {
            let response = AppError::from(ServiceError::from(err)).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
