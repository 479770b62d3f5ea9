use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::email_log::{self, EmailStatus};
use services::{
    email_service::{BulkItem, BulkReport, EmailService},
    error::{ServiceError, ServiceResult},
};
use util::state::AppState;
use validator::Validate;

use super::common::BulkEmailRequest;
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{format_validation_errors, visible_student};

async fn run_bulk(app_state: &AppState, user: &AuthUser, req: BulkEmailRequest) -> ServiceResult<BulkReport> {
    let db = app_state.db();
    let mut students = Vec::with_capacity(req.student_ids.len());
    let mut missing = Vec::new();
    for id in req.student_ids {
        match visible_student(db, user, id).await {
            Ok(s) => students.push(s),
            Err(ServiceError::NotFound(_)) => missing.push(id),
            Err(e) => return Err(e),
        }
    }

    let mut report = EmailService::bulk_send_summaries(db, app_state.mailer(), students, req.term_label.trim()).await?;
    for student_id in missing {
        report.skipped += 1;
        report.items.push(BulkItem::Skipped {
            student_id,
            reason: "student not found".into(),
        });
    }
    Ok(report)
}

/// POST /emails/bulk
///
/// Sends each selected student their attendance summary for the term.
/// Advisers can only select their own advisees.
///
/// ### Request Body
/// ```json
/// { "student_ids": [1, 2, 3], "term_label": "1st Semester 2025-2026" }
/// ```
pub async fn bulk_send(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BulkEmailRequest>,
) -> (StatusCode, Json<ApiResponse<BulkReport>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    match run_bulk(&app_state, &user, req).await {
        Ok(report) => {
            let message = format!(
                "Bulk email finished: {} sent, {} failed, {} skipped",
                report.sent, report.failed, report.skipped
            );
            (StatusCode::OK, Json(ApiResponse::success(report, message)))
        }
        Err(e) => service_error(e),
    }
}

async fn run_resend(app_state: &AppState, user: &AuthUser, log_id: i64) -> ServiceResult<email_log::Model> {
    let db = app_state.db();
    let log = email_log::Model::get_by_id(db, log_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Email log not found".into()))?;
    visible_student(db, user, log.student_id)
        .await
        .map_err(|_| ServiceError::NotFound("Email log not found".into()))?;

    EmailService::resend(db, app_state.mailer(), log.id).await
}

/// POST /emails/logs/{log_id}/resend
///
/// Sends a logged email again and updates the same log row. Delivery failure
/// still returns 200 with the row marked FAILED.
pub async fn resend(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(log_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Option<email_log::Model>>>) {
    match run_resend(&app_state, &user, log_id).await {
        Ok(log) => {
            let message = match log.status {
                EmailStatus::Sent => "Email resent successfully".to_string(),
                _ => format!(
                    "Email could not be sent: {}",
                    log.error_message.as_deref().unwrap_or("unknown error")
                ),
            };
            (StatusCode::OK, Json(ApiResponse::success(Some(log), message)))
        }
        Err(e) => service_error(e),
    }
}
