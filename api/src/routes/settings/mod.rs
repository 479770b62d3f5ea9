//! # settings Routes Module
//!
//! The single row of attendance policy. Staff can read it, admins change it.

pub mod get;
pub mod put;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, put},
};
use util::state::AppState;

use crate::auth::guards::{allow_admin, allow_staff};
use get::get_settings;
use put::update_settings;

/// - `GET /settings` → `get_settings` (staff)
/// - `PUT /settings` → `update_settings` (admin)
pub fn settings_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_settings).route_layer(from_fn_with_state(app_state.clone(), allow_staff)),
        )
        .route(
            "/",
            put(update_settings).route_layer(from_fn_with_state(app_state, allow_admin)),
        )
}
