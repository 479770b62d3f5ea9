//! HTTP route entry point for `/api/...`.
//!
//! Route groups are organized by domain, each protected by the matching
//! access guard:
//! - `/health` → liveness (public)
//! - `/auth` → login, student login, logout, current user, photo flag
//! - `/students`, `/subjects`, `/attendance`, `/emails` → staff (admins and advisers)
//! - `/calendar` → staff, holiday cleanup admin only
//! - `/settings` → staff read, admin write
//! - `/me` → the logged-in student's own attendance
//! - `/admin` → session sweeps (admin)

use crate::auth::guards::{allow_admin, allow_staff, allow_student};
use crate::routes::{
    admin::admin_routes, attendance::attendance_routes, auth::auth_routes, calendar::calendar_routes,
    emails::emails_routes, health::health_routes, me::me_routes, settings::settings_routes,
    students::students_routes, subjects::subjects_routes,
};
use axum::{Router, middleware::from_fn_with_state};
use util::state::AppState;

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod calendar;
pub mod common;
pub mod emails;
pub mod health;
pub mod me;
pub mod settings;
pub mod students;
pub mod subjects;

/// Builds the complete application router for all HTTP endpoints.
///
/// Guards resolve the bearer session once per request and insert an
/// [`AuthUser`](crate::auth::AuthUser) for the handlers.
pub fn routes(app_state: AppState) -> Router<AppState> {
    let staff = || from_fn_with_state(app_state.clone(), allow_staff);

    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes(app_state.clone()))
        .nest("/students", students_routes().route_layer(staff()))
        .nest("/subjects", subjects_routes().route_layer(staff()))
        .nest(
            "/attendance",
            attendance_routes(app_state.clone()).route_layer(staff()),
        )
        .nest("/emails", emails_routes().route_layer(staff()))
        .nest(
            "/calendar",
            calendar_routes(app_state.clone()).route_layer(staff()),
        )
        .nest("/settings", settings_routes(app_state.clone()))
        .nest(
            "/me",
            me_routes().route_layer(from_fn_with_state(app_state.clone(), allow_student)),
        )
        .nest(
            "/admin",
            admin_routes().route_layer(from_fn_with_state(app_state.clone(), allow_admin)),
        )
        .with_state(app_state)
}
