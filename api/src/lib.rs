//! HTTP layer of the attendance monitor: routing, session guards and the
//! JSON response envelope.

pub mod auth;
pub mod response;
pub mod routes;

use axum::{
    Router,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    middleware::from_fn,
};
use tower_http::cors::CorsLayer;
use util::state::AppState;

use crate::auth::middleware::{log_request, validate_host};
use crate::routes::routes;

/// Full application: `/api` routes with host validation, request logging and CORS.
pub fn build_app(app_state: AppState) -> Router {
    let cors = CorsLayer::very_permissive().expose_headers([CONTENT_DISPOSITION, CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes(app_state.clone()))
        .layer(from_fn(validate_host))
        .layer(from_fn(log_request))
        .layer(cors)
        .with_state(app_state)
}
