//! LPR route definitions

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn lpr_routes() -> Router<AppState> {
    Router::new().route("/api/lpr/identify", post(identify_plate))
}
