//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response envelope.
///
/// Errors use the same shape with `success: false`, produced by
/// `AppError::into_response`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response carrying data.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Create a success response carrying data and a message.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    /// Replace the message when one is given.
    #[must_use]
    pub fn message_opt(mut self, message: Option<String>) -> Self {
        if message.is_some() {
            self.message = message;
        }
        self
    }
}

impl ApiResponse<()> {
    /// Create a success response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_only_omits_data() {
        let body = serde_json::to_value(ApiResponse::message("Food donation rejected.")).ok();
        assert_eq!(
            body,
            Some(json!({"success": true, "message": "Food donation rejected."}))
        );
    }

    #[test]
    fn test_data_with_message() {
        let body =
            serde_json::to_value(ApiResponse::with_message("Post liked!", json!({"liked": true})))
                .ok();
        assert_eq!(
            body,
            Some(json!({"success": true, "message": "Post liked!", "data": {"liked": true}}))
        );
    }
}
