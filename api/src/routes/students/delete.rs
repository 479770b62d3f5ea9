use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::student;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::visible_student;

/// DELETE /students/{student_id}
///
/// Removes the student together with their enrollments and attendance rows.
pub async fn delete_student(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(student_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = app_state.db();
    if let Err(e) = visible_student(db, &user, student_id).await {
        return service_error(e);
    }

    match student::Model::delete_by_id(db, student_id).await {
        Ok(_) => {
            tracing::info!(student_id, by = user.user_id, "Student deleted");
            (StatusCode::OK, Json(ApiResponse::success((), "Student deleted successfully")))
        }
        Err(e) => service_error(e.into()),
    }
}
