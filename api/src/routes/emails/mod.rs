//! # emails Routes Module
//!
//! Semester summaries and the email log under `/emails`.

pub mod common;
pub mod get;
pub mod post;

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

use get::{export_logs_csv, list_logs};
use post::{bulk_send, resend};

/// - `POST /emails/bulk` → `bulk_send`
/// - `GET /emails/logs` → `list_logs`
/// - `GET /emails/logs/export` → `export_logs_csv`
/// - `POST /emails/logs/{log_id}/resend` → `resend`
pub fn emails_routes() -> Router<AppState> {
    Router::new()
        .route("/bulk", post(bulk_send))
        .route("/logs", get(list_logs))
        .route("/logs/export", get(export_logs_csv))
        .route("/logs/{log_id}/resend", post(resend))
}
