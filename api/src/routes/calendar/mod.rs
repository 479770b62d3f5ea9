//! # calendar Routes Module
//!
//! School calendar under `/calendar`. Holidays stop absence derivation for
//! their date, and the cleanup route removes derived absences already on file.

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use util::state::AppState;

use crate::auth::guards::allow_admin;
use delete::delete_event;
use get::list_events;
use post::{cleanup_holiday_absences, create_event};
use put::update_event;

/// - `GET /calendar/events` → `list_events`
/// - `POST /calendar/events` → `create_event`
/// - `PUT /calendar/events/{event_id}` → `update_event`
/// - `DELETE /calendar/events/{event_id}` → `delete_event`
/// - `POST /calendar/cleanup-holiday-absences` → `cleanup_holiday_absences` (admin)
pub fn calendar_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{event_id}", put(update_event).delete(delete_event))
        .route(
            "/cleanup-holiday-absences",
            post(cleanup_holiday_absences).route_layer(from_fn_with_state(app_state, allow_admin)),
        )
}
