use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::subject::{self, SubjectChanges};
use util::state::AppState;
use validator::Validate;

use super::common::UpdateSubjectRequest;
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{conflict_on_unique, format_validation_errors, owned_subject};

/// PUT /subjects/{subject_id}
///
/// Partial update; `is_active: false` archives the subject.
pub async fn update_subject(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(subject_id): Path<i64>,
    Json(req): Json<UpdateSubjectRequest>,
) -> (StatusCode, Json<ApiResponse<Option<subject::Model>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    let db = app_state.db();
    let current = match owned_subject(db, &user, subject_id).await {
        Ok(s) => s,
        Err(e) => return service_error(e),
    };

    let start = req.schedule_time_start.or(current.schedule_time_start);
    let end = req.schedule_time_end.or(current.schedule_time_end);
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("End time must be after start time")),
            );
        }
    }

    let changes = SubjectChanges {
        code: req.code,
        name: req.name,
        schedule_days: req.schedule_days,
        schedule_time_start: req.schedule_time_start,
        schedule_time_end: req.schedule_time_end,
        is_active: req.is_active,
    };

    match current.update(db, changes).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(updated), "Subject updated successfully")),
        ),
        Err(e) => service_error(conflict_on_unique(e, "A subject with this code")),
    }
}
