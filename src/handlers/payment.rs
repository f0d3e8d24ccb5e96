//! Payment-related API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::ApiResponse;
use crate::payment::{ConfirmPaymentResponse, CreatePaymentResponse, PaymentDetails};
use crate::state::AppState;

/// Request body for payment creation
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub session_id: Uuid,
    pub payment_method: String,
}

/// Create a payment for an active session
pub async fn create_payment(
    State(app_state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> ApiResult<Json<ApiResponse<CreatePaymentResponse>>> {
    let response = app_state
        .payment_service
        .create_payment(request.session_id, &request.payment_method)
        .await?;

    Ok(Json(ApiResponse::ok(response)))
}

/// Confirm a payment through the gateway and settle the session
pub async fn confirm_payment(
    State(app_state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ConfirmPaymentResponse>>> {
    let response = app_state.payment_service.confirm_payment(payment_id).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// Get payment details
pub async fn get_payment(
    State(app_state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<PaymentDetails>>> {
    let details = app_state.payment_service.get_payment_details(payment_id).await?;
    Ok(Json(ApiResponse::ok(details)))
}
