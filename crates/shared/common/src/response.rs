//! Response envelope shared by every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard API response wrapper: `{status, message, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with data
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 201 with data (common pattern for POST endpoints)
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// 200 without data
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_envelope() {
        let body = serde_json::to_value(ApiResponse::created("Coupon created", 5)).unwrap();
        assert_eq!(body["status"], 201);
        assert_eq!(body["data"], 5);
    }

    #[test]
    fn test_message_has_null_data() {
        let body = serde_json::to_value(ApiResponse::message("Coupon deleted")).unwrap();
        assert_eq!(body["status"], 200);
        assert!(body["data"].is_null());
    }

    #[test]
    fn test_into_response_uses_envelope_status() {
        let response = ApiResponse::created("ok", "x").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
