use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::user::Role;
use services::session_service::SessionService;
use util::{config, state::AppState};

use crate::auth::extractors::bearer_token;
use crate::auth::user::AuthUser;
use crate::response::ApiResponse;

// --- Role Based Access Guards ---

#[derive(serde::Serialize, Default)]
pub struct Empty;

type GuardError = (StatusCode, Json<ApiResponse<Empty>>);

/// Resolves the bearer session, extends it and inserts the caller into the
/// request extensions.
async fn extract_and_insert_authuser(
    app_state: &AppState,
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardError> {
    let (mut parts, body) = req.into_parts();
    let token = bearer_token(&mut parts).await.ok_or((
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error("Authentication required")),
    ))?;

    let (session, user) = SessionService::authenticate(app_state.db(), &token, config::session_ttl_minutes())
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Invalid or expired session")),
            )
        })?;

    let auth = AuthUser {
        user_id: user.id,
        role: user.role,
        show_photo: SessionService::show_photo(&session),
        session_id: session.id,
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(auth.clone());
    Ok((req, auth))
}

/// Runs the handler and tags the response with the caller so `log_request`
/// can report who made the request.
async fn run_as(user: AuthUser, req: Request<Body>, next: Next) -> Response {
    let mut res = next.run(req).await;
    res.extensions_mut().insert(user);
    res
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(&app_state, req).await?;
    Ok(run_as(user, req, next).await)
}

/// Admins and advisers.
pub async fn allow_staff(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(&app_state, req).await?;

    if !user.is_staff() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Staff access required")),
        ));
    }

    Ok(run_as(user, req, next).await)
}

/// Admin-only guard.
pub async fn allow_admin(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(&app_state, req).await?;

    if !user.is_admin() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Admin access required")),
        ));
    }

    Ok(run_as(user, req, next).await)
}

/// Student accounts only.
pub async fn allow_student(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(&app_state, req).await?;

    if user.role != Role::Student {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Student access required")),
        ));
    }

    Ok(run_as(user, req, next).await)
}
