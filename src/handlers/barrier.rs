//! Barrier control API handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::barrier::{BarrierAck, BarrierCloseAck};
use crate::error::ApiResult;
use crate::models::ApiResponse;
use crate::state::AppState;

/// Request body for barrier operations
#[derive(Debug, Deserialize)]
pub struct OpenBarrierRequest {
    pub session_id: Uuid,
}

/// Open the entry barrier
pub async fn open_entry_barrier(
    State(app_state): State<AppState>,
    Json(request): Json<OpenBarrierRequest>,
) -> ApiResult<Json<ApiResponse<BarrierAck>>> {
    let ack = app_state.barrier_service.open_entry(request.session_id).await;
    Ok(Json(ApiResponse::ok(ack)))
}

/// Open the exit barrier
pub async fn open_exit_barrier(
    State(app_state): State<AppState>,
    Json(request): Json<OpenBarrierRequest>,
) -> ApiResult<Json<ApiResponse<BarrierAck>>> {
    let ack = app_state.barrier_service.open_exit(request.session_id).await;
    Ok(Json(ApiResponse::ok(ack)))
}

/// Close the entry barrier
pub async fn close_entry_barrier(
    State(app_state): State<AppState>,
) -> ApiResult<Json<ApiResponse<BarrierCloseAck>>> {
    let ack = app_state.barrier_service.close_entry().await;
    Ok(Json(ApiResponse::ok(ack)))
}

/// Close the exit barrier
pub async fn close_exit_barrier(
    State(app_state): State<AppState>,
) -> ApiResult<Json<ApiResponse<BarrierCloseAck>>> {
    let ack = app_state.barrier_service.close_exit().await;
    Ok(Json(ApiResponse::ok(ack)))
}
