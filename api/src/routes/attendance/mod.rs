//! # attendance Routes Module
//!
//! RFID scans, manual corrections and the daily log view under `/attendance`.
//! Viewing a log runs the derivation pass so absentees show up as ABSENT.

pub mod common;
pub mod delete;
pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use util::state::AppState;

use crate::auth::guards::allow_admin;
use delete::delete_record;
use get::{export_logs_csv, get_logs};
use post::{manual_entry, scan};

/// - `POST /attendance/scan` → `scan`
/// - `POST /attendance/manual` → `manual_entry`
/// - `GET /attendance/logs` → `get_logs`
/// - `GET /attendance/logs/export` → `export_logs_csv`
/// - `DELETE /attendance/{record_id}` → `delete_record` (admin)
pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/scan", post(scan))
        .route("/manual", post(manual_entry))
        .route("/logs", get(get_logs))
        .route("/logs/export", get(export_logs_csv))
        .route(
            "/{record_id}",
            delete(delete_record).route_layer(from_fn_with_state(app_state, allow_admin)),
        )
}
