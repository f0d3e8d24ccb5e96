//! License plate recognition API handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::lpr::PlateReading;
use crate::models::ApiResponse;
use crate::state::AppState;

/// Request body for plate identification
#[derive(Debug, Deserialize, Validate)]
pub struct IdentifyRequest {
    #[validate(length(min = 1, message = "image data is required"))]
    pub image: String,
}

/// Identify a license plate from image data
pub async fn identify_plate(
    State(app_state): State<AppState>,
    Json(request): Json<IdentifyRequest>,
) -> ApiResult<Json<ApiResponse<PlateReading>>> {
    request.validate()?;

    let reading = app_state
        .lpr_service
        .identify(&request.image)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(ApiResponse::ok(reading)))
}
