use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use tracing::{error, warn};

use super::models::ErrorResponse;
use super::validation::UrlError;
use crate::publisher::PublishError;
use crate::render::RenderError;

const INTERNAL_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),
    #[error("payload invalid: {0}")]
    InvalidPayload(String),
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("publishing failed: {0}")]
    Publish(#[from] PublishError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidUrl(_) | ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Render(_) | ApiError::Publish(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidUrl(_) => "INVALID_URL",
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::Render(_) | ApiError::Publish(_) | ApiError::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Text returned to the caller; server-side failures stay generic.
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, code = self.code(), "Request failed");
        } else {
            warn!(error = %self, code = self.code(), "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}
