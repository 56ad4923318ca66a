use crate::tracker::TrackerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failure returned by a handler: the status to send plus a plain-text reason.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

/// Bad input is the caller's fault (400); a known mode that this deployment
/// switched off conflicts with the server configuration (409).
impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        let status = match err {
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::ModeDisabled(_) => StatusCode::CONFLICT,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
