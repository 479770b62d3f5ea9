use axum::{Json, extract::State, http::StatusCode};
use db::models::{student, user};
use serde::Serialize;
use util::state::AppState;

use super::post::PhotoFlagResponse;
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::UserResponse;

#[derive(Debug, Serialize, Default)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub student: Option<student::Model>,
    pub show_student_photo: bool,
}

/// GET /auth/me
///
/// Returns the current account, plus the linked registry entry for students.
pub async fn get_me(
    State(app_state): State<AppState>,
    auth: AuthUser,
) -> (StatusCode, Json<ApiResponse<MeResponse>>) {
    let db = app_state.db();

    let user = match user::Model::get_by_id(db, auth.user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return (StatusCode::NOT_FOUND, Json(ApiResponse::error("User not found"))),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let student = student::Model::find_by_user_id(db, user.id).await.ok().flatten();

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            MeResponse {
                user: user.into(),
                student,
                show_student_photo: auth.show_photo,
            },
            "User data retrieved successfully",
        )),
    )
}

/// GET /auth/session/photo
pub async fn get_photo_flag(
    auth: AuthUser,
) -> (StatusCode, Json<ApiResponse<PhotoFlagResponse>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            PhotoFlagResponse { show_student_photo: auth.show_photo },
            "Photo setting retrieved",
        )),
    )
}
