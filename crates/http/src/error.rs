//! HTTP error types and implementations

use crate::types::BaseResponse;
#[cfg(feature = "server")]
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// HTTP-specific errors
#[derive(Error, Debug)]
pub enum HttpError {
    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    /// Service unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl HttpError {
    pub fn status_code(&self) -> u16 {
        match self {
            HttpError::NotFound(_) => 404,
            HttpError::BadRequest(_) => 400,
            HttpError::InternalServerError(_) => 500,
            HttpError::ServiceUnavailable(_) => 503,
        }
    }

    /// Error envelope carried in the response body
    pub fn envelope(&self) -> BaseResponse {
        BaseResponse::new("", self.to_string(), self.status_code())
    }
}

impl From<warden_core::Error> for HttpError {
    fn from(err: warden_core::Error) -> Self {
        HttpError::InternalServerError(err.to_string())
    }
}

#[cfg(feature = "server")]
impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.envelope())).into_response()
    }
}

/// Result type alias using HttpError
pub type Result<T> = std::result::Result<T, HttpError>;
