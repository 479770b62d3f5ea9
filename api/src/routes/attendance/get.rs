use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use db::models::{attendance_record, student, subject};
use sea_orm::DatabaseConnection;
use services::{
    clock,
    derivation_service::{DerivationService, Scope},
    error::ServiceResult,
};
use std::collections::HashMap;
use util::{csv, state::AppState};

use super::common::{ExportQuery, LogEntry, LogsQuery, LogsResponse};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{csv_attachment, in_scope, subject_scope};

async fn load_logs(app_state: &AppState, user: &AuthUser, query: LogsQuery) -> ServiceResult<LogsResponse> {
    let db = app_state.db();
    let (subject, scope) = subject_scope(db, user, query.subject_id).await?;
    let today = clock::local_today();
    let date = query.date.unwrap_or(today);

    let derivation =
        DerivationService::derive_absences(db, app_state.mailer(), subject.id, date, scope, today, Utc::now()).await?;

    let students: HashMap<i64, student::Model> = student::Model::list(db, scope.adviser_id())
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let records = attendance_record::Model::for_subject_on(db, subject.id, date)
        .await?
        .into_iter()
        .filter_map(|record| {
            let s = students.get(&record.student_id).filter(|s| in_scope(s, scope))?;
            Some(LogEntry {
                student_name: s.name.clone(),
                student_number: s.student_number.clone(),
                record,
            })
        })
        .collect();

    Ok(LogsResponse { derivation, records })
}

/// GET /attendance/logs?subject_id=3&date=2025-10-13
///
/// Returns the day's records for a subject. Enrolled students with no record
/// are first written as ABSENT, and may trigger warning emails. `date`
/// defaults to today; future dates are listed without derivation.
pub async fn get_logs(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<LogsQuery>,
) -> (StatusCode, Json<ApiResponse<Option<LogsResponse>>>) {
    match load_logs(&app_state, &user, query).await {
        Ok(logs) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(logs), "Attendance logs retrieved successfully")),
        ),
        Err(e) => service_error(e),
    }
}

fn clock_time(t: Option<NaiveTime>) -> String {
    t.map(|t| t.format("%I:%M %p").to_string())
        .unwrap_or_else(|| "--:--".into())
}

async fn build_export(
    db: &DatabaseConnection,
    user: &AuthUser,
    query: &ExportQuery,
    date: NaiveDate,
) -> ServiceResult<String> {
    let subjects: HashMap<i64, subject::Model> = subject::Model::list(db, None, false)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let students: HashMap<i64, student::Model> = student::Model::list(db, None)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let records = match query.subject_id {
        Some(subject_id) => {
            let (subject, scope) = subject_scope(db, user, subject_id).await?;
            attendance_record::Model::for_subject_on(db, subject.id, date)
                .await?
                .into_iter()
                .filter(|r| students.get(&r.student_id).is_some_and(|s| in_scope(s, scope)))
                .collect::<Vec<_>>()
        }
        None => {
            let scope = user.scope();
            attendance_record::Model::on_date(db, date)
                .await?
                .into_iter()
                .filter(|r| match scope {
                    Scope::All => true,
                    Scope::Adviser(id) => {
                        subjects.get(&r.subject_id).is_some_and(|s| s.is_owned_by(id))
                            || students.get(&r.student_id).is_some_and(|s| in_scope(s, scope))
                    }
                })
                .collect()
        }
    };

    let mut rows: Vec<(&student::Model, attendance_record::Model)> = records
        .into_iter()
        .filter_map(|r| Some((students.get(&r.student_id)?, r)))
        .collect();
    rows.sort_by(|a, b| a.0.name.cmp(&b.0.name).then(a.1.subject_id.cmp(&b.1.subject_id)));

    let mut out = csv::row(["Student Number", "Student Name", "Subject", "Date", "Time In", "Time Out", "Status"]);
    for (student, record) in rows {
        let code = subjects.get(&record.subject_id).map(|s| s.code.as_str()).unwrap_or("N/A");
        let (day, time_in, time_out) = (record.date.to_string(), clock_time(record.time_in), clock_time(record.time_out));
        let status = record.status.to_string();
        out.push_str(&csv::row([
            student.student_number.as_deref().unwrap_or(""),
            student.name.as_str(),
            code,
            day.as_str(),
            time_in.as_str(),
            time_out.as_str(),
            status.as_str(),
        ]));
    }
    Ok(out)
}

/// GET /attendance/logs/export?subject_id=3&date=2025-10-13
///
/// Downloads the day's records as CSV. Without `subject_id` every subject the
/// caller can see is included. The export does not run the derivation pass.
///
/// **Response**: `text/csv` attachment with columns
/// `Student Number,Student Name,Subject,Date,Time In,Time Out,Status`
pub async fn export_logs_csv(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let date = query.date.unwrap_or_else(clock::local_today);
    match build_export(app_state.db(), &user, &query, date).await {
        Ok(body) => csv_attachment(&format!("attendance_log_{date}.csv"), body),
        Err(e) => service_error::<()>(e).into_response(),
    }
}
