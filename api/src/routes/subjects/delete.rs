use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::{enrollment, subject, subject_schedule};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::owned_subject;

/// DELETE /subjects/{subject_id}
///
/// Deletes the subject along with its schedules, enrollments and attendance.
pub async fn delete_subject(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(subject_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = app_state.db();
    if let Err(e) = owned_subject(db, &user, subject_id).await {
        return service_error(e);
    }

    match subject::Model::delete_by_id(db, subject_id).await {
        Ok(_) => {
            tracing::info!(subject_id, by = user.user_id, "Subject deleted");
            (StatusCode::OK, Json(ApiResponse::success((), "Subject deleted successfully")))
        }
        Err(e) => service_error(e.into()),
    }
}

/// DELETE /subjects/{subject_id}/schedules/{schedule_id}
pub async fn delete_schedule(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((subject_id, schedule_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = app_state.db();
    if let Err(e) = owned_subject(db, &user, subject_id).await {
        return service_error(e);
    }

    match subject_schedule::Model::delete_for_subject(db, subject_id, schedule_id).await {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::success((), "Schedule removed successfully"))),
        Ok(false) => (StatusCode::NOT_FOUND, Json(ApiResponse::error("Schedule not found"))),
        Err(e) => service_error(e.into()),
    }
}

/// DELETE /subjects/{subject_id}/students/{student_id}
///
/// Unenrolls the student. Existing attendance rows are kept.
pub async fn unenroll_student(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((subject_id, student_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = app_state.db();
    if let Err(e) = owned_subject(db, &user, subject_id).await {
        return service_error(e);
    }

    match enrollment::Model::unenroll(db, student_id, subject_id).await {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::success((), "Student unenrolled successfully"))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Student is not enrolled in this subject")),
        ),
        Err(e) => service_error(e.into()),
    }
}
