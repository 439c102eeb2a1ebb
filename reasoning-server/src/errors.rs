use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use reasoning_core::ReasoningError;

pub type AppResult<T> = Result<T, AppError>;

/// Axum-facing error wrapper: a status code plus a message, matching the
/// `{"error": {"message", "status"}}` body shape used across this stack.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        AppError { status, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<ReasoningError> for AppError {
    fn from(err: ReasoningError) -> Self {
        match err {
            ReasoningError::InputInvalid(msg) => AppError::bad_request(msg),
            ReasoningError::ZoneConfigError(msg) => AppError::internal(msg),
            ReasoningError::StoreUnavailable => AppError::service_unavailable("event store unavailable"),
            ReasoningError::StateCorrupted { track_id, reason } => {
                AppError::internal(format!("track {track_id} state corrupted: {reason}"))
            }
            ReasoningError::SubscriberSlow => AppError::internal("subscriber buffer full"),
            ReasoningError::Serialization(e) => AppError::internal(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}
