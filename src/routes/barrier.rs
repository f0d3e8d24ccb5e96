//! Barrier route definitions

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn barrier_routes() -> Router<AppState> {
    Router::new()
        .route("/api/barrier/entry/open", post(open_entry_barrier))
        .route("/api/barrier/entry/close", post(close_entry_barrier))
        .route("/api/barrier/exit/open", post(open_exit_barrier))
        .route("/api/barrier/exit/close", post(close_exit_barrier))
}
