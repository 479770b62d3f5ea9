use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::{enrollment, subject, subject_schedule};
use services::error::ServiceError;
use util::state::AppState;
use validator::Validate;

use super::common::{CreateSubjectRequest, EnrollRequest, EnrollResponse, ScheduleRequest};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{conflict_on_unique, format_validation_errors, owned_subject, visible_student};

/// POST /subjects
///
/// Creates a subject owned by the calling adviser. Admins may assign another
/// adviser with `adviser_id`.
///
/// ### Request Body
/// ```json
/// {
///   "code": "MATH7",
///   "name": "Mathematics 7",
///   "schedule_days": "MON,WED,FRI",
///   "schedule_time_start": "08:00:00",
///   "schedule_time_end": "09:00:00"
/// }
/// ```
///
/// ### Responses
/// - `201 Created`
/// - `400 Bad Request` - validation failure
/// - `409 Conflict` - the adviser already has a subject with this code
pub async fn create_subject(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateSubjectRequest>,
) -> (StatusCode, Json<ApiResponse<Option<subject::Model>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    let db = app_state.db();
    let adviser_id = if user.is_admin() { req.adviser_id } else { Some(user.user_id) };

    let created = match subject::Model::create(
        db,
        &req.code,
        req.name.trim(),
        adviser_id,
        req.schedule_time_start,
        req.schedule_time_end,
    )
    .await
    {
        Ok(s) => s,
        Err(e) => return service_error(conflict_on_unique(e, "A subject with this code")),
    };

    let created = match req.schedule_days {
        Some(days) => {
            let changes = subject::SubjectChanges { schedule_days: Some(days), ..Default::default() };
            match created.update(db, changes).await {
                Ok(s) => s,
                Err(e) => return service_error(e.into()),
            }
        }
        None => created,
    };

    tracing::info!(subject_id = created.id, code = %created.code, by = user.user_id, "Subject created");
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(created), "Subject created successfully")),
    )
}

/// POST /subjects/{subject_id}/schedules
///
/// Adds a weekly slot (`day_of_week`, 0 = Monday) or a one-off dated slot.
/// A dated slot replaces the weekly slots on its date.
pub async fn add_schedule(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(subject_id): Path<i64>,
    Json(req): Json<ScheduleRequest>,
) -> (StatusCode, Json<ApiResponse<Option<subject_schedule::Model>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    let db = app_state.db();
    if let Err(e) = owned_subject(db, &user, subject_id).await {
        return service_error(e);
    }

    match subject_schedule::Model::create(db, subject_id, req.day_of_week, req.date, req.time_start, req.time_end)
        .await
    {
        Ok(slot) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(slot), "Schedule added successfully")),
        ),
        Err(e) => service_error(e.into()),
    }
}

/// POST /subjects/{subject_id}/students
///
/// Enrolls a batch of students. Students the caller cannot see are reported
/// under `not_found`; re-enrolling is a no-op reported under
/// `already_enrolled`.
pub async fn enroll_students(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(subject_id): Path<i64>,
    Json(req): Json<EnrollRequest>,
) -> (StatusCode, Json<ApiResponse<EnrollResponse>>) {
    if req.student_ids.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("student_ids must not be empty")),
        );
    }

    let db = app_state.db();
    if let Err(e) = owned_subject(db, &user, subject_id).await {
        return service_error(e);
    }

    let mut response = EnrollResponse::default();
    for student_id in req.student_ids {
        match visible_student(db, &user, student_id).await {
            Ok(_) => {}
            Err(ServiceError::NotFound(_)) => {
                response.not_found.push(student_id);
                continue;
            }
            Err(e) => return service_error(e),
        }

        match enrollment::Model::enroll(db, student_id, subject_id).await {
            Ok(true) => response.enrolled.push(student_id),
            Ok(false) => response.already_enrolled.push(student_id),
            Err(e) => return service_error(e.into()),
        }
    }

    tracing::info!(
        subject_id,
        enrolled = response.enrolled.len(),
        skipped = response.already_enrolled.len() + response.not_found.len(),
        "Enrollment batch processed"
    );
    (
        StatusCode::OK,
        Json(ApiResponse::success(response, "Enrollment processed")),
    )
}
