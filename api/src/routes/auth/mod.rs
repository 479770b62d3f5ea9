//! # auth Routes Module
//!
//! Routes for the `/auth` endpoint group.
//!
//! ## Structure
//! - `post.rs` - login, student login, logout, photo toggle
//! - `get.rs` - current user info, photo flag

pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;
use get::{get_me, get_photo_flag};
use post::{login, logout, student_login, toggle_photo_flag};

/// Builds the `/auth` route group.
///
/// - `POST /auth/login` → `login` (public)
/// - `POST /auth/student-login` → `student_login` (public)
/// - `POST /auth/logout` → `logout`
/// - `GET /auth/me` → `get_me`
/// - `GET /auth/session/photo` → `get_photo_flag`
/// - `POST /auth/session/photo` → `toggle_photo_flag`
pub fn auth_routes(app_state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_me))
        .route("/session/photo", get(get_photo_flag).post(toggle_photo_flag))
        .route_layer(from_fn_with_state(app_state, allow_authenticated));

    Router::new()
        .route("/login", post(login))
        .route("/student-login", post(student_login))
        .merge(authenticated)
}
