//! Centralized API error handling for ParkWise
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses. The error codes are
//! part of the API contract and must stay stable.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pricing::PricingError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    // Resource exhaustion - recoverable by retrying later or with
    // different preferences
    #[error("No available parking spaces")]
    LotFull,

    // State conflicts - caller error, never retried automatically
    #[error("Vehicle already has an active parking session")]
    DuplicateSession,

    #[error("Parking session is not active. Current status: {0}")]
    SessionNotActive(String),

    #[error("Parking session already has exit time")]
    SessionAlreadyExited,

    #[error("Payment already completed")]
    PaymentAlreadyCompleted,

    #[error("Cannot confirm failed payment")]
    PaymentFailed,

    // Not found - terminal
    #[error("Parking space not found")]
    SpaceNotFound,

    #[error("Parking session not found")]
    SessionNotFound,

    #[error("Payment not found")]
    PaymentNotFound,

    // Validation - always recoverable
    #[error("Unsupported payment method: {0}. Supported methods: credit_card, debit_card, cash, mobile_wallet, upi")]
    UnsupportedPaymentMethod(String),

    #[error("Exit time cannot be before entry time")]
    InvalidTimeRange,

    #[error("Duration cannot exceed {0} days")]
    DurationExceeded(i64),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    // External dependency - retried internally up to the configured bound,
    // then surfaced
    #[error("Payment processing failed after {attempts} attempts: {reason}")]
    GatewayError { attempts: u32, reason: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::LotFull => "LOT_FULL",
            ApiError::DuplicateSession => "DUPLICATE_SESSION",
            ApiError::SessionNotActive(_) => "SESSION_NOT_ACTIVE",
            ApiError::SessionAlreadyExited => "SESSION_ALREADY_EXITED",
            ApiError::PaymentAlreadyCompleted => "PAYMENT_ALREADY_COMPLETED",
            ApiError::PaymentFailed => "PAYMENT_FAILED",
            ApiError::SpaceNotFound => "SPACE_NOT_FOUND",
            ApiError::SessionNotFound => "SESSION_NOT_FOUND",
            ApiError::PaymentNotFound => "PAYMENT_NOT_FOUND",
            ApiError::UnsupportedPaymentMethod(_) => "UNSUPPORTED_PAYMENT_METHOD",
            ApiError::InvalidTimeRange => "INVALID_TIME_RANGE",
            ApiError::DurationExceeded(_) => "DURATION_EXCEEDED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::GatewayError { .. } => "PAYMENT_GATEWAY_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::LotFull
            | ApiError::DuplicateSession
            | ApiError::SessionNotActive(_)
            | ApiError::SessionAlreadyExited
            | ApiError::PaymentAlreadyCompleted
            | ApiError::PaymentFailed => StatusCode::CONFLICT,
            ApiError::SpaceNotFound | ApiError::SessionNotFound | ApiError::PaymentNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::UnsupportedPaymentMethod(_)
            | ApiError::InvalidTimeRange
            | ApiError::DurationExceeded(_)
            | ApiError::BadRequest(_)
            | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::GatewayError { .. } => StatusCode::BAD_GATEWAY,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log server errors
        match &self {
            ApiError::DatabaseError(_)
            | ApiError::InternalError(_)
            | ApiError::GatewayError { .. } => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Convenience conversions from common error types

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::ExitBeforeEntry => ApiError::InvalidTimeRange,
            PricingError::DurationExceeded { max_days } => ApiError::DurationExceeded(max_days),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::LotFull.error_code(), "LOT_FULL");
        assert_eq!(ApiError::DuplicateSession.error_code(), "DUPLICATE_SESSION");
        assert_eq!(
            ApiError::PaymentAlreadyCompleted.error_code(),
            "PAYMENT_ALREADY_COMPLETED"
        );
        assert_eq!(
            ApiError::UnsupportedPaymentMethod("bitcoin".to_string()).error_code(),
            "UNSUPPORTED_PAYMENT_METHOD"
        );
        assert_eq!(
            ApiError::GatewayError {
                attempts: 3,
                reason: "timeout".to_string()
            }
            .error_code(),
            "PAYMENT_GATEWAY_ERROR"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::LotFull.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::SessionNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::UnsupportedPaymentMethod("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::GatewayError {
                attempts: 3,
                reason: "timeout".to_string()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_pricing_error_conversion() {
        let err: ApiError = PricingError::ExitBeforeEntry.into();
        assert_eq!(err.error_code(), "INVALID_TIME_RANGE");

        let err: ApiError = PricingError::DurationExceeded { max_days: 30 }.into();
        assert_eq!(err.error_code(), "DURATION_EXCEEDED");
    }
}
