//! HTTP response handling for errors

use super::types::MetricsError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::{debug, error};

impl ResponseError for MetricsError {
    fn status_code(&self) -> StatusCode {
        match self {
            MetricsError::Validation(_) | MetricsError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            MetricsError::Integrity(_) | MetricsError::Crypto(_) => StatusCode::BAD_REQUEST,
            MetricsError::NotFound(_) => StatusCode::NOT_FOUND,
            MetricsError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_client_error() {
            debug!("Rejected request: {}", self);
        } else {
            error!("Request failed: {}", self);
        }

        let (error_code, message) = match self {
            MetricsError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            MetricsError::Serialization(_) => ("PARSING_ERROR", self.to_string()),
            MetricsError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            MetricsError::Integrity(_) => ("INTEGRITY_ERROR", self.to_string()),
            MetricsError::Crypto(_) => ("DECRYPTION_ERROR", "Payload could not be decrypted".to_string()),
            MetricsError::Database(_) => ("DATABASE_ERROR", "Database operation failed".to_string()),
            MetricsError::MaxRetriesExceeded { .. } => ("STORAGE_CONFLICT", self.to_string()),
            MetricsError::Timeout(_) => ("TIMEOUT", self.to_string()),
            _ => ("INTERNAL_ERROR", "An internal error occurred".to_string()),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

/// Standard error response format
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
}
