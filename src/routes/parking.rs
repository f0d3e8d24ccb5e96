//! Parking route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn parking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/parking/allocate", post(allocate_space))
        .route("/api/parking/spaces", get(list_spaces))
        .route("/api/parking/spaces/statistics", get(space_statistics))
        .route("/api/parking/spaces/:id/release", post(release_space))
        .route("/api/parking/sessions/active", get(active_sessions))
}
