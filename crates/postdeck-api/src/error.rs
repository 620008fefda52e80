use axum::{
    Json,
    extract::rejection::{BytesRejection, JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use tracing::debug;

use postdeck_platforms::PlatformError;

/// Unified API error type. Renders as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    message: String,
}

impl ApiErr {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Build a closure that logs a DB/IO error and returns `500 Internal Server Error`.
    pub fn from_db<E: fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| {
            tracing::error!("{context}: {e:#}");
            Self::internal("internal server error")
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        Self::bad_request("Invalid request data")
    }
}

/// Ids in paths are UUIDs; anything else cannot name a row.
impl From<PathRejection> for ApiErr {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected path: {}", rejection.body_text());
        Self::not_found("Not found")
    }
}

impl From<BytesRejection> for ApiErr {
    fn from(rejection: BytesRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::new(StatusCode::PAYLOAD_TOO_LARGE, "Upload too large"),
            _ => Self::bad_request("Invalid request body"),
        }
    }
}

impl From<PlatformError> for ApiErr {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::UnknownPlatform(_) => Self::not_found(e.to_string()),
            PlatformError::OAuth(_) | PlatformError::Publish(_) => {
                tracing::error!("Platform error: {}", e);
                Self::new(StatusCode::BAD_GATEWAY, e.to_string())
            }
        }
    }
}
