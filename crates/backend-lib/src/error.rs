// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::room::RoomError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Room error: {0}")]
    Room(#[from] RoomError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported frame: {0}")]
    UnsupportedFrame(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Room(RoomError::RoomNotFound) => StatusCode::NOT_FOUND,
            AppError::Room(RoomError::GameAlreadyStarted | RoomError::RoomFull) => {
                StatusCode::CONFLICT
            },
            AppError::Room(RoomError::NotHost) => StatusCode::FORBIDDEN,
            AppError::Room(RoomError::CodesExhausted) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) | AppError::Malformed(_) | AppError::UnsupportedFrame(_) => {
                StatusCode::BAD_REQUEST
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Room(RoomError::RoomNotFound) => "ROOM_001",
            AppError::Room(RoomError::GameAlreadyStarted) => "ROOM_002",
            AppError::Room(RoomError::RoomFull) => "ROOM_003",
            AppError::Room(RoomError::NotHost) => "ROOM_004",
            AppError::Room(RoomError::CodesExhausted) => "ROOM_005",
            AppError::Validation(_) => "VAL_001",
            AppError::Malformed(_) => "JSON_001",
            AppError::UnsupportedFrame(_) => "FRAME_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            // Room errors are already user-facing reasons
            AppError::Room(e) => e.to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::Malformed(_) => "Invalid message format".to_string(),
            AppError::UnsupportedFrame(_) => "Only JSON text frames are supported".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Room(RoomError::RoomFull);
        assert_eq!(err.to_string(), "Room error: Room full");

        let err = AppError::UnsupportedFrame("binary".to_string());
        assert!(err.to_string().contains("binary"));
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Room(RoomError::RoomNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Room(RoomError::GameAlreadyStarted).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Validation(ValidationError::InvalidPlayerName("too long".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Room(RoomError::NotHost).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_app_error_error_codes() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        assert_eq!(AppError::Malformed(json_err).error_code(), "JSON_001");
        assert_eq!(AppError::Room(RoomError::RoomFull).error_code(), "ROOM_003");
        assert_eq!(
            AppError::UnsupportedFrame("binary".to_string()).error_code(),
            "FRAME_001"
        );
    }

    #[test]
    fn test_sanitized_message_hides_parser_details() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\"a\": tru").unwrap_err();
        let err = AppError::Malformed(json_err);
        assert_eq!(err.sanitized_message(), "Invalid message format");
        assert_eq!(
            AppError::Room(RoomError::GameAlreadyStarted).sanitized_message(),
            "Game already started"
        );
    }

    #[tokio::test]
    async fn test_error_into_response() {
        let response = AppError::Validation(ValidationError::InvalidChatMessage(
            "too long".to_string(),
        ))
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }
}
