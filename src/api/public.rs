//! Public API types

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::core::ErrorKind;

// Errors

pub enum ApiError {
    /// A chat action failed
    Chat(ErrorKind),
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Chat(ErrorKind::InvalidImage(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Chat(ErrorKind::UnsupportedGlyph { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Chat(ErrorKind::EmptyContent) => StatusCode::BAD_REQUEST,
            ApiError::Chat(ErrorKind::GatewayFailure(_)) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Chat(kind) => kind.code(),
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Chat(kind) => kind.to_string(),
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Internal(err) => format!("Something went wrong: {}", err),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::warn!("{}", message);
        }

        (
            status,
            Json(json!({"error": self.code(), "message": message})),
        )
            .into_response()
    }
}

impl From<ErrorKind> for ApiError {
    fn from(err: ErrorKind) -> Self {
        Self::Chat(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(format!("Invalid upload: {}", err.body_text()))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// Re-export public types from each route

pub mod sessions {
    pub use crate::api::routes::sessions::public::*;
}
