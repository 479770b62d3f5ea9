use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::student::{self, StudentChanges};
use util::state::AppState;
use validator::Validate;

use super::common::UpdateStudentRequest;
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{conflict_on_unique, format_validation_errors, visible_student};

/// PUT /students/{student_id}
///
/// Partial update. Only admins can move a student to another adviser.
pub async fn update_student(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(student_id): Path<i64>,
    Json(req): Json<UpdateStudentRequest>,
) -> (StatusCode, Json<ApiResponse<Option<student::Model>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }
    if !req.email_is_valid() {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error("Invalid email format")));
    }
    if req.adviser_id.is_some() && !user.is_admin() {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Only admins can reassign advisers")),
        );
    }

    let db = app_state.db();
    let current = match visible_student(db, &user, student_id).await {
        Ok(s) => s,
        Err(e) => return service_error(e),
    };

    let changes = StudentChanges {
        name: req.name,
        rfid_tag: req.rfid_tag,
        student_number: req.student_number,
        email: req.email,
        email_opt_in: req.email_opt_in,
        adviser_id: req.adviser_id,
        profile_picture_path: req.profile_picture_path,
    };

    match current.update(db, changes).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(updated), "Student updated successfully")),
        ),
        Err(e) => service_error(conflict_on_unique(e, "A student with this RFID tag or student number")),
    }
}
