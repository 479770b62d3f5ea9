use axum::{Json, extract::State, http::StatusCode};
use db::models::student;
use serde::{Deserialize, Serialize};
use services::auth_service::{AuthService, LoginOutcome};
use services::session_service::SessionService;
use util::{config, state::AppState};
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{UserResponse, format_validation_errors};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username, or an adviser's employee ID.
    #[validate(length(min = 1, message = "Username or employee ID is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Default)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
    pub student: Option<student::Model>,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            token: outcome.session.id,
            expires_at: outcome.session.expires_at.to_rfc3339(),
            user: outcome.user.into(),
            student: outcome.student,
        }
    }
}

/// POST /auth/login
///
/// Authenticate a staff account and open a session.
///
/// ### Request Body
/// ```json
/// { "username": "maria", "password": "secret" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ token, expires_at, user }`
/// - `400 Bad Request` on a missing field
/// - `401 Unauthorized` - "Invalid username/employee ID or password."
/// - `409 Conflict` - the account already has a live session and the
///   single-session policy is `block`
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<ApiResponse<LoginResponse>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    match AuthService::login(
        app_state.db(),
        &req.username,
        &req.password,
        config::single_session_policy(),
        config::session_ttl_minutes(),
    )
    .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ApiResponse::success(LoginResponse::from(outcome), "Login successful")),
        ),
        Err(e) => service_error(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StudentLoginRequest {
    #[validate(length(min = 1, message = "RFID tag is required"))]
    pub rfid_tag: String,
}

/// POST /auth/student-login
///
/// Badge-only login for students. The first login creates the student's
/// account and links it to the registry entry.
///
/// ### Responses
/// - `200 OK` with `{ token, expires_at, user, student }`
/// - `404 Not Found` - unknown badge
/// - `409 Conflict` - already logged in elsewhere
pub async fn student_login(
    State(app_state): State<AppState>,
    Json(req): Json<StudentLoginRequest>,
) -> (StatusCode, Json<ApiResponse<LoginResponse>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    match AuthService::student_login(
        app_state.db(),
        &req.rfid_tag,
        config::single_session_policy(),
        config::session_ttl_minutes(),
    )
    .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ApiResponse::success(LoginResponse::from(outcome), "Login successful")),
        ),
        Err(e) => service_error(e),
    }
}

/// POST /auth/logout
///
/// Deletes the caller's session. The token stops working immediately.
pub async fn logout(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> (StatusCode, Json<ApiResponse<()>>) {
    match SessionService::logout(app_state.db(), &user.session_id).await {
        Ok(_) => (StatusCode::OK, Json(ApiResponse::success((), "Logged out"))),
        Err(e) => service_error(e),
    }
}

#[derive(Debug, Serialize, Default)]
pub struct PhotoFlagResponse {
    pub show_student_photo: bool,
}

/// POST /auth/session/photo
///
/// Flips whether scan results show the student's photo for this session.
pub async fn toggle_photo_flag(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> (StatusCode, Json<ApiResponse<PhotoFlagResponse>>) {
    match SessionService::toggle_photo(app_state.db(), &user.session_id).await {
        Ok(show) => {
            let message = if show { "Student photos shown" } else { "Student photos hidden" };
            (
                StatusCode::OK,
                Json(ApiResponse::success(PhotoFlagResponse { show_student_photo: show }, message)),
            )
        }
        Err(e) => service_error(e),
    }
}
