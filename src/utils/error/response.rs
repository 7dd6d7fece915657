//! HTTP response handling for errors

use super::types::GatewayError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::StoreUnavailable(_) | GatewayError::UnknownScope(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            #[cfg(feature = "redis")]
            GatewayError::Redis(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Validation(_) | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            // Infrastructure details never leak to callers.
            GatewayError::StoreUnavailable(_) => (
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable".to_string(),
            ),
            #[cfg(feature = "redis")]
            GatewayError::Redis(_) => (
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable".to_string(),
            ),
            GatewayError::UnknownScope(_) => (
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable".to_string(),
            ),
            GatewayError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            GatewayError::BadRequest(_) => ("BAD_REQUEST", self.to_string()),
            GatewayError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            GatewayError::Config(_) => ("CONFIG_ERROR", self.to_string()),
            _ => ("INTERNAL_ERROR", "An internal error occurred".to_string()),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
                request_id: None,
            },
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

/// Standard error response format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
    pub request_id: Option<String>,
}
