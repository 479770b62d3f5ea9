//! # me Routes Module
//!
//! Read-only attendance view for a logged-in student.

pub mod get;

use axum::{Router, routing::get};
use util::state::AppState;

use get::get_my_attendance;

/// - `GET /me/attendance` → `get_my_attendance`
pub fn me_routes() -> Router<AppState> {
    Router::new().route("/attendance", get(get_my_attendance))
}
