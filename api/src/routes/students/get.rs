use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::{attendance_record, enrollment, student, user};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use services::error::ServiceResult;
use std::collections::HashMap;
use util::{csv, state::AppState};

use super::common::{REGISTRY_COLUMNS, StudentDetail, StudentSubjectSummary, tally};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{csv_attachment, visible_student};

#[derive(Debug, Deserialize)]
pub struct ListStudentsQuery {
    /// Case-insensitive match on name, RFID tag, student number or email.
    pub q: Option<String>,
}

/// GET /students
///
/// Lists students visible to the caller, ordered by name.
pub async fn list_students(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListStudentsQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<student::Model>>>) {
    let students = match student::Model::list(app_state.db(), user.adviser_filter()).await {
        Ok(s) => s,
        Err(e) => return service_error(e.into()),
    };

    let needle = query.q.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
    let students = match needle {
        None => students,
        Some(needle) => students
            .into_iter()
            .filter(|s| {
                let hit = |v: &Option<String>| v.as_deref().is_some_and(|v| v.to_lowercase().contains(&needle));
                s.name.to_lowercase().contains(&needle) || hit(&s.rfid_tag) || hit(&s.student_number) || hit(&s.email)
            })
            .collect(),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(students, "Students retrieved successfully")),
    )
}

async fn load_detail(app_state: &AppState, user: &AuthUser, student_id: i64) -> ServiceResult<StudentDetail> {
    let db = app_state.db();
    let student = visible_student(db, user, student_id).await?;

    let records = attendance_record::Model::for_student(db, student.id, None).await?;
    let mut subjects: Vec<StudentSubjectSummary> = enrollment::Model::subjects_for_student(db, student.id)
        .await?
        .into_iter()
        .map(|s| StudentSubjectSummary {
            subject_id: s.id,
            code: s.code,
            name: s.name,
            ..Default::default()
        })
        .collect();

    for record in &records {
        if let Some(summary) = subjects.iter_mut().find(|s| s.subject_id == record.subject_id) {
            tally(record.status, summary);
        }
    }

    Ok(StudentDetail { student, subjects })
}

/// GET /students/{student_id}
///
/// Returns the student with per-subject present/late/absent counts.
pub async fn get_student(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(student_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Option<StudentDetail>>>) {
    match load_detail(&app_state, &user, student_id).await {
        Ok(detail) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(detail), "Student retrieved successfully")),
        ),
        Err(e) => service_error(e),
    }
}

async fn build_registry_csv(db: &DatabaseConnection, user: &AuthUser) -> ServiceResult<String> {
    let students = student::Model::list(db, user.adviser_filter()).await?;

    let mut usernames: HashMap<i64, String> = HashMap::new();
    for adviser_id in students.iter().filter_map(|s| s.adviser_id) {
        if usernames.contains_key(&adviser_id) {
            continue;
        }
        if let Some(adviser) = user::Model::get_by_id(db, adviser_id).await? {
            usernames.insert(adviser_id, adviser.username);
        }
    }

    let mut out = csv::row(REGISTRY_COLUMNS);
    for s in &students {
        let adviser = s.adviser_id.and_then(|id| usernames.get(&id)).map(String::as_str);
        out.push_str(&csv::row([
            s.rfid_tag.as_deref().unwrap_or(""),
            s.student_number.as_deref().unwrap_or(""),
            s.name.as_str(),
            s.email.as_deref().unwrap_or(""),
            if s.email_opt_in { "true" } else { "false" },
            adviser.unwrap_or(""),
        ]));
    }
    Ok(out)
}

/// GET /students/export
///
/// The visible registry as CSV, in the column layout `POST /students/import`
/// accepts.
pub async fn export_students_csv(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    match build_registry_csv(app_state.db(), &user).await {
        Ok(body) => csv_attachment("students.csv", body),
        Err(e) => service_error::<()>(e).into_response(),
    }
}
