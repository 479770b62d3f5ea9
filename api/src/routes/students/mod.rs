//! # students Routes Module
//!
//! The student registry under `/students`. Advisers only ever see and edit
//! their own advisees; admins see everyone.

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

use delete::delete_student;
use get::{export_students_csv, get_student, list_students};
use post::{create_student, import_students};
use put::update_student;

/// - `GET /students` → `list_students`
/// - `POST /students` → `create_student`
/// - `GET /students/export` → `export_students_csv`
/// - `POST /students/import` → `import_students`
/// - `GET /students/{student_id}` → `get_student`
/// - `PUT /students/{student_id}` → `update_student`
/// - `DELETE /students/{student_id}` → `delete_student`
pub fn students_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/export", get(export_students_csv))
        .route("/import", post(import_students))
        .route(
            "/{student_id}",
            get(get_student).put(update_student).delete(delete_student),
        )
}
