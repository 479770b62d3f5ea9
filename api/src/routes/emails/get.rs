use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::SecondsFormat;
use db::models::{email_log, student};
use sea_orm::DatabaseConnection;
use services::error::ServiceResult;
use std::collections::HashMap;
use util::{csv, state::AppState};

use super::common::LogsQuery;
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::csv_attachment;

async fn load(
    db: &DatabaseConnection,
    user: &AuthUser,
    query: &LogsQuery,
    limit: u64,
) -> ServiceResult<Vec<email_log::Model>> {
    let advisees: Option<Vec<i64>> = match user.adviser_filter() {
        None => None,
        Some(adviser_id) => Some(
            student::Model::list(db, Some(adviser_id))
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect(),
        ),
    };

    Ok(email_log::Model::list(db, query.email_type, query.status, advisees.as_deref(), limit).await?)
}

/// GET /emails/logs?type=WARNING&status=FAILED&limit=50
///
/// Newest first. Advisers only see emails about their advisees.
pub async fn list_logs(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<LogsQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<email_log::Model>>>) {
    match load(app_state.db(), &user, &query, query.limit()).await {
        Ok(logs) => (
            StatusCode::OK,
            Json(ApiResponse::success(logs, "Email logs retrieved successfully")),
        ),
        Err(e) => service_error(e),
    }
}

async fn build_export(db: &DatabaseConnection, user: &AuthUser, query: &LogsQuery) -> ServiceResult<String> {
    let logs = load(db, user, query, query.export_limit()).await?;
    let names: HashMap<i64, String> = student::Model::list(db, None)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let mut out = csv::row([
        "Created At", "Student", "Recipient", "Type", "Subject", "Status", "Sent At", "Error",
    ]);
    for log in logs {
        let created = log.created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let sent = log
            .sent_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        let (email_type, status) = (log.email_type.to_string(), log.status.to_string());
        out.push_str(&csv::row([
            created.as_str(),
            names.get(&log.student_id).map(String::as_str).unwrap_or(""),
            log.email_to.as_str(),
            email_type.as_str(),
            log.subject_line.as_str(),
            status.as_str(),
            sent.as_str(),
            log.error_message.as_deref().unwrap_or(""),
        ]));
    }
    Ok(out)
}

/// GET /emails/logs/export?type=WARNING&status=FAILED
///
/// Same filters as the log listing, as a CSV download. Bodies are left out.
pub async fn export_logs_csv(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<LogsQuery>,
) -> Response {
    match build_export(app_state.db(), &user, &query).await {
        Ok(body) => csv_attachment("email_logs.csv", body),
        Err(e) => service_error::<()>(e).into_response(),
    }
}
