use axum::{Extension, Json, extract::State, http::StatusCode};
use db::models::student;
use services::{
    attendance_service::{AttendanceService, ManualEntry, ManualResult, ScanResult},
    clock,
    derivation_service::Scope,
    error::{ServiceError, ServiceResult},
};
use util::state::AppState;
use validator::Validate;

use super::common::ScanRequest;
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{format_validation_errors, in_scope, subject_scope, visible_student};

async fn run_scan(app_state: &AppState, user: &AuthUser, req: &ScanRequest) -> ServiceResult<ScanResult> {
    let db = app_state.db();
    let (subject, scope) = subject_scope(db, user, req.subject_id).await?;

    if let Scope::Adviser(_) = scope {
        if let Some(s) = student::Model::find_by_rfid(db, req.rfid_tag.trim()).await? {
            if !in_scope(&s, scope) {
                return Err(ServiceError::Forbidden("This student is not one of your advisees".into()));
            }
        }
    }

    let now = clock::local_now();
    let at = req
        .date
        .unwrap_or(now.date())
        .and_time(req.manual_time.unwrap_or(now.time()));

    let mut result = AttendanceService::scan(db, app_state.mailer(), req.rfid_tag.trim(), subject.id, at).await?;
    if !user.show_photo {
        result.student.profile_picture_path = None;
    }
    Ok(result)
}

/// POST /attendance/scan
///
/// Records an RFID tap against a subject. The first tap of the day is the
/// time-in, a tap near the end of class is the time-out.
///
/// ### Request Body
/// ```json
/// { "rfid_tag": "04A1B2C3", "subject_id": 3 }
/// ```
///
/// ### Responses
/// - `200 OK` - `data.action` is `time_in`, `time_out`, `already_timed_in` or `already_complete`
/// - `400 Bad Request` - not enrolled, or outside the class window
/// - `404 Not Found` - unknown RFID tag or subject
pub async fn scan(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ScanRequest>,
) -> (StatusCode, Json<ApiResponse<Option<ScanResult>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    match run_scan(&app_state, &user, &req).await {
        Ok(result) => {
            let message = result.message();
            (StatusCode::OK, Json(ApiResponse::success(Some(result), message)))
        }
        Err(e) => {
            tracing::info!(rfid_tag = %req.rfid_tag, subject_id = req.subject_id, reason = %e, "Scan rejected");
            service_error(e)
        }
    }
}

async fn run_manual(app_state: &AppState, user: &AuthUser, entry: ManualEntry) -> ServiceResult<ManualResult> {
    let db = app_state.db();
    let (_, scope) = subject_scope(db, user, entry.subject_id).await?;
    if let Scope::Adviser(_) = scope {
        visible_student(db, user, entry.student_id).await?;
    }
    AttendanceService::manual_entry(db, app_state.mailer(), entry).await
}

/// POST /attendance/manual
///
/// Creates or corrects a record by hand.
///
/// ### Request Body
/// ```json
/// {
///   "student_id": 7,
///   "subject_id": 3,
///   "date": "2025-10-13",
///   "time_in": "08:05:00",
///   "status": "PRESENT",
///   "skip_validation": false
/// }
/// ```
pub async fn manual_entry(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(entry): Json<ManualEntry>,
) -> (StatusCode, Json<ApiResponse<Option<ManualResult>>>) {
    match run_manual(&app_state, &user, entry).await {
        Ok(result) => {
            tracing::info!(
                record_id = result.record.id,
                action = ?result.action,
                by = user.user_id,
                "Manual attendance entry"
            );
            (
                StatusCode::OK,
                Json(ApiResponse::success(Some(result), "Attendance saved successfully")),
            )
        }
        Err(e) => service_error(e),
    }
}
