use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use db::models::{enrollment, student, subject, subject_schedule};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use services::error::{ServiceError, ServiceResult};
use std::collections::HashSet;
use util::state::AppState;

use super::common::SubjectDetail;
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{in_scope, subject_scope};

#[derive(Debug, Deserialize)]
pub struct ListSubjectsQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// Subjects an adviser can see: the ones they own plus any subject one of
/// their advisees is enrolled in.
async fn adviser_subjects(
    db: &DatabaseConnection,
    adviser_id: i64,
    active_only: bool,
) -> ServiceResult<Vec<subject::Model>> {
    let mut reachable: HashSet<i64> = HashSet::new();
    for advisee in student::Model::list(db, Some(adviser_id)).await? {
        for s in enrollment::Model::subjects_for_student(db, advisee.id).await? {
            reachable.insert(s.id);
        }
    }

    Ok(subject::Model::list(db, None, active_only)
        .await?
        .into_iter()
        .filter(|s| s.is_owned_by(adviser_id) || reachable.contains(&s.id))
        .collect())
}

/// GET /subjects
///
/// Admins get every subject. Advisers get their own subjects and the
/// subjects their advisees attend. `?active_only=true` hides archived ones.
pub async fn list_subjects(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListSubjectsQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<subject::Model>>>) {
    let db = app_state.db();
    let result = match user.adviser_filter() {
        None => subject::Model::list(db, None, query.active_only).await.map_err(ServiceError::from),
        Some(adviser_id) => adviser_subjects(db, adviser_id, query.active_only).await,
    };

    match result {
        Ok(subjects) => (
            StatusCode::OK,
            Json(ApiResponse::success(subjects, "Subjects retrieved successfully")),
        ),
        Err(e) => service_error(e),
    }
}

async fn load_detail(db: &DatabaseConnection, user: &AuthUser, subject_id: i64) -> ServiceResult<SubjectDetail> {
    let (subject, scope) = subject_scope(db, user, subject_id).await?;
    let schedules = subject_schedule::Model::for_subject(db, subject.id).await?;
    let enrolled_count = enrollment::Model::student_ids_for_subject(db, subject.id, scope.adviser_id())
        .await?
        .len();
    Ok(SubjectDetail { subject, schedules, enrolled_count })
}

/// GET /subjects/{subject_id}
pub async fn get_subject(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(subject_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Option<SubjectDetail>>>) {
    match load_detail(app_state.db(), &user, subject_id).await {
        Ok(detail) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(detail), "Subject retrieved successfully")),
        ),
        Err(e) => service_error(e),
    }
}

/// GET /subjects/{subject_id}/schedules
pub async fn list_schedules(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(subject_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<subject_schedule::Model>>>) {
    let db = app_state.db();
    if let Err(e) = subject_scope(db, &user, subject_id).await {
        return service_error(e);
    }

    match subject_schedule::Model::for_subject(db, subject_id).await {
        Ok(slots) => (
            StatusCode::OK,
            Json(ApiResponse::success(slots, "Schedules retrieved successfully")),
        ),
        Err(e) => service_error(e.into()),
    }
}

async fn enrolled_students(
    db: &DatabaseConnection,
    user: &AuthUser,
    subject_id: i64,
) -> ServiceResult<Vec<student::Model>> {
    let (subject, scope) = subject_scope(db, user, subject_id).await?;
    let ids: HashSet<i64> = enrollment::Model::student_ids_for_subject(db, subject.id, None)
        .await?
        .into_iter()
        .collect();

    Ok(student::Model::list(db, None)
        .await?
        .into_iter()
        .filter(|s| ids.contains(&s.id) && in_scope(s, scope))
        .collect())
}

/// GET /subjects/{subject_id}/students
///
/// Enrolled students, limited to the caller's advisees when they do not own
/// the subject.
pub async fn list_enrolled_students(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(subject_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<student::Model>>>) {
    match enrolled_students(app_state.db(), &user, subject_id).await {
        Ok(students) => (
            StatusCode::OK,
            Json(ApiResponse::success(students, "Enrolled students retrieved successfully")),
        ),
        Err(e) => service_error(e),
    }
}
