//! Parking-related API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::models::{ApiResponse, ParkingSpace};
use crate::parking::{ActiveSession, AllocationPreferences, AllocationResult, SpaceStatistics};
use crate::state::AppState;

/// Request body for space allocation
#[derive(Debug, Deserialize, Validate)]
pub struct AllocateRequest {
    #[validate(length(min = 1, max = 16, message = "license plate must be 1-16 characters"))]
    pub license_plate: String,
    pub zone: Option<String>,
    pub floor: Option<i32>,
}

/// Allocate a parking space to a vehicle
pub async fn allocate_space(
    State(app_state): State<AppState>,
    Json(request): Json<AllocateRequest>,
) -> ApiResult<Json<ApiResponse<AllocationResult>>> {
    request.validate()?;

    let preferences = AllocationPreferences {
        zone: request.zone,
        floor: request.floor,
    };

    let result = app_state
        .parking_service
        .allocate(&request.license_plate, &preferences)
        .await?;

    Ok(Json(ApiResponse::ok(result)))
}

/// Release a parking space (administrative)
pub async fn release_space(
    State(app_state): State<AppState>,
    Path(space_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ParkingSpace>>> {
    let space = app_state.parking_service.release(space_id).await?;
    Ok(Json(ApiResponse::ok(space)))
}

/// List all parking spaces
pub async fn list_spaces(
    State(app_state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<ParkingSpace>>>> {
    let spaces = app_state.parking_service.get_all_spaces().await?;
    Ok(Json(ApiResponse::ok(spaces)))
}

/// Occupancy statistics
pub async fn space_statistics(
    State(app_state): State<AppState>,
) -> ApiResult<Json<ApiResponse<SpaceStatistics>>> {
    let stats = app_state.parking_service.space_statistics().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// Active parking sessions
pub async fn active_sessions(
    State(app_state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<ActiveSession>>>> {
    let sessions = app_state.parking_service.active_sessions().await?;
    Ok(Json(ApiResponse::ok(sessions)))
}
