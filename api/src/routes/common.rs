//! Helpers shared by the route groups: validation messages, response DTOs and
//! adviser-scoped access checks.

use axum::{
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use db::models::{enrollment, student, subject, user};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use services::derivation_service::Scope;
use services::error::{ServiceError, ServiceResult};
use validator::ValidationErrors;

use crate::auth::AuthUser;

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Serialize, Default)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub employee_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            role: user.role.to_string(),
            employee_id: user.employee_id,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Turns a unique-constraint failure into a 409 with `what` in the message;
/// anything else stays a database error.
pub fn conflict_on_unique(e: DbErr, what: &str) -> ServiceError {
    if e.to_string().contains("UNIQUE constraint failed") {
        ServiceError::Conflict(format!("{what} already exists"))
    } else {
        ServiceError::Database(e)
    }
}

/// Loads a subject and works out which of its students `user` may see.
///
/// Admins and the owning adviser see everyone. Another adviser may act on the
/// subject only when one of their advisees is enrolled, and then only for
/// those advisees.
pub async fn subject_scope(
    db: &DatabaseConnection,
    user: &AuthUser,
    subject_id: i64,
) -> ServiceResult<(subject::Model, Scope)> {
    let subject = subject::Model::get_by_id(db, subject_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Subject not found".into()))?;

    if user.is_admin() || subject.is_owned_by(user.user_id) {
        return Ok((subject, Scope::All));
    }

    let advisees = enrollment::Model::student_ids_for_subject(db, subject.id, Some(user.user_id)).await?;
    if advisees.is_empty() {
        return Err(ServiceError::Forbidden("You do not have access to this subject".into()));
    }
    Ok((subject, Scope::Adviser(user.user_id)))
}

/// Subjects an adviser may manage (create schedules, enroll, edit): admins any,
/// advisers only their own.
pub async fn owned_subject(
    db: &DatabaseConnection,
    user: &AuthUser,
    subject_id: i64,
) -> ServiceResult<subject::Model> {
    let subject = subject::Model::get_by_id(db, subject_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Subject not found".into()))?;

    if user.is_admin() || subject.is_owned_by(user.user_id) {
        Ok(subject)
    } else {
        Err(ServiceError::Forbidden("You do not own this subject".into()))
    }
}

/// Loads a student visible to `user`: admins see all, advisers their advisees.
pub async fn visible_student(
    db: &DatabaseConnection,
    user: &AuthUser,
    student_id: i64,
) -> ServiceResult<student::Model> {
    let student = student::Model::get_by_id(db, student_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Student not found".into()))?;

    match user.adviser_filter() {
        Some(adviser_id) if student.adviser_id != Some(adviser_id) => {
            Err(ServiceError::NotFound("Student not found".into()))
        }
        _ => Ok(student),
    }
}

/// Whether a student falls under a derivation/listing scope.
pub fn in_scope(student: &student::Model, scope: Scope) -> bool {
    match scope {
        Scope::All => true,
        Scope::Adviser(id) => student.adviser_id == Some(id),
    }
}

/// A `text/csv` download named `filename`.
pub fn csv_attachment(filename: &str, body: String) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .unwrap_or(HeaderValue::from_static("attachment")),
    );
    (StatusCode::OK, headers, body).into_response()
}
