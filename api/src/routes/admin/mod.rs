//! # admin Routes Module
//!
//! Administrative session control under `/admin`.

pub mod get;
pub mod post;

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

use get::list_sweeps;
use post::sweep_sessions;

/// - `POST /admin/sessions/sweep` → `sweep_sessions`
/// - `GET /admin/sessions/sweeps` → `list_sweeps`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/sweep", post(sweep_sessions))
        .route("/sessions/sweeps", get(list_sweeps))
}
