use axum::{Extension, Json, extract::State, http::StatusCode};
use db::models::{
    student::{self, NewStudent},
    user::{self, Role},
};
use sea_orm::{DatabaseConnection, DbErr};
use services::error::{ServiceError, ServiceResult};
use std::collections::HashMap;
use util::{csv, state::AppState};
use validator::{Validate, ValidateEmail};

use super::common::{CreateStudentRequest, ImportReport, ImportStudentsRequest, parse_opt_in};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::{conflict_on_unique, format_validation_errors};

/// POST /students
///
/// Registers a student. Advisers become the student's adviser; admins may
/// pass `adviser_id`.
///
/// ### Request Body
/// ```json
/// {
///   "name": "Ana Cruz",
///   "rfid_tag": "04A1B2C3",
///   "student_number": "2025-0001",
///   "email": "parent@home.test"
/// }
/// ```
///
/// ### Responses
/// - `201 Created`
/// - `400 Bad Request` - validation failure
/// - `409 Conflict` - RFID tag or student number already registered
pub async fn create_student(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateStudentRequest>,
) -> (StatusCode, Json<ApiResponse<Option<student::Model>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    if req.name.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error("Name is required")));
    }

    let db = app_state.db();
    let adviser_id = if user.is_admin() { req.adviser_id } else { Some(user.user_id) };

    let new = NewStudent {
        name: &req.name,
        rfid_tag: req.rfid_tag.as_deref(),
        student_number: req.student_number.as_deref(),
        email: req.email.as_deref(),
        email_opt_in: req.email_opt_in.unwrap_or(true),
        adviser_id,
    };
    let created = match student::Model::register(db, new).await {
        Ok(s) => s,
        Err(e) => return service_error(conflict_on_unique(e, "A student with this RFID tag or student number")),
    };

    tracing::info!(student_id = created.id, by = user.user_id, "Student registered");
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(created), "Student created successfully")),
    )
}

enum RowOutcome {
    Imported,
    Skipped,
    Rejected(String),
}

async fn adviser_by_username(
    db: &DatabaseConnection,
    username: &str,
    cache: &mut HashMap<String, Option<i64>>,
) -> Result<Option<i64>, DbErr> {
    if let Some(hit) = cache.get(username) {
        return Ok(*hit);
    }
    let id = user::Model::find_by_username(db, username)
        .await?
        .filter(|u| u.role == Role::Adviser)
        .map(|u| u.id);
    cache.insert(username.to_string(), id);
    Ok(id)
}

async fn import_row(
    db: &DatabaseConnection,
    user: &AuthUser,
    record: &csv::Record,
    advisers: &mut HashMap<String, Option<i64>>,
) -> Result<RowOutcome, DbErr> {
    let Some(name) = record.get("name") else {
        return Ok(RowOutcome::Rejected("name is required".into()));
    };
    let rfid_tag = record.get("rfid_tag");
    let student_number = record.get("student_number");

    if let Some(tag) = rfid_tag {
        if student::Model::find_by_rfid(db, tag).await?.is_some() {
            return Ok(RowOutcome::Skipped);
        }
    }
    if let Some(number) = student_number {
        if student::Model::find_by_student_number(db, number).await?.is_some() {
            return Ok(RowOutcome::Skipped);
        }
    }

    let email = record.get("email");
    if let Some(e) = email.filter(|e| !e.validate_email()) {
        return Ok(RowOutcome::Rejected(format!("invalid email '{e}'")));
    }
    let email_opt_in = match parse_opt_in(record.get("email_opt_in")) {
        Ok(v) => v,
        Err(reason) => return Ok(RowOutcome::Rejected(reason)),
    };

    let adviser_id = match (user.is_admin(), record.get("adviser")) {
        (false, _) => Some(user.user_id),
        (true, None) => None,
        (true, Some(username)) => match adviser_by_username(db, username, advisers).await? {
            Some(id) => Some(id),
            None => return Ok(RowOutcome::Rejected(format!("unknown adviser '{username}'"))),
        },
    };

    let new = NewStudent { name, rfid_tag, student_number, email, email_opt_in, adviser_id };
    match student::Model::register(db, new).await {
        Ok(_) => Ok(RowOutcome::Imported),
        Err(e) if e.to_string().contains("UNIQUE constraint failed") => Ok(RowOutcome::Rejected(
            "RFID tag or student number appears twice".into(),
        )),
        Err(e) => Err(e),
    }
}

async fn import_students_csv(
    db: &DatabaseConnection,
    user: &AuthUser,
    csv_data: &str,
) -> ServiceResult<ImportReport> {
    let records = csv::parse(csv_data).map_err(ServiceError::Validation)?;
    if records.is_empty() {
        return Err(ServiceError::Validation("CSV has no data rows".into()));
    }

    let mut advisers = HashMap::new();
    let mut report = ImportReport::default();
    for record in &records {
        match import_row(db, user, record, &mut advisers).await? {
            RowOutcome::Imported => report.imported += 1,
            RowOutcome::Skipped => report.skipped += 1,
            RowOutcome::Rejected(reason) => report.errors.push(format!("Row {}: {reason}", record.line)),
        }
    }
    Ok(report)
}

/// POST /students/import
///
/// Bulk-registers students from CSV text with the columns `rfid_tag`,
/// `student_number`, `name`, `email`, `email_opt_in` and `adviser`. Rows whose
/// tag or number is already registered are skipped. Bad rows are reported and
/// do not stop the import. Advisers own every student they import and the
/// `adviser` column is only honoured for admins.
///
/// ### Request Body
/// ```json
/// { "csv_data": "rfid_tag,name\n04A1B2C3,Ana Cruz\n" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ imported, skipped, errors }`
/// - `400 Bad Request` - empty or headerless CSV
pub async fn import_students(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ImportStudentsRequest>,
) -> (StatusCode, Json<ApiResponse<ImportReport>>) {
    match import_students_csv(app_state.db(), &user, &req.csv_data).await {
        Ok(report) => {
            tracing::info!(
                imported = report.imported,
                skipped = report.skipped,
                failed = report.errors.len(),
                by = user.user_id,
                "Student CSV import finished"
            );
            (StatusCode::OK, Json(ApiResponse::success(report, "Students imported")))
        }
        Err(e) => service_error(e),
    }
}
