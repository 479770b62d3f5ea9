//! # subjects Routes Module
//!
//! Subjects, their meeting schedules and their enrollments under `/subjects`.

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    routing::{delete, get},
};
use util::state::AppState;

use delete::{delete_schedule, delete_subject, unenroll_student};
use get::{get_subject, list_enrolled_students, list_schedules, list_subjects};
use post::{add_schedule, create_subject, enroll_students};
use put::update_subject;

/// - `GET /subjects` → `list_subjects`
/// - `POST /subjects` → `create_subject`
/// - `GET /subjects/{subject_id}` → `get_subject`
/// - `PUT /subjects/{subject_id}` → `update_subject`
/// - `DELETE /subjects/{subject_id}` → `delete_subject`
/// - `GET /subjects/{subject_id}/schedules` → `list_schedules`
/// - `POST /subjects/{subject_id}/schedules` → `add_schedule`
/// - `DELETE /subjects/{subject_id}/schedules/{schedule_id}` → `delete_schedule`
/// - `GET /subjects/{subject_id}/students` → `list_enrolled_students`
/// - `POST /subjects/{subject_id}/students` → `enroll_students`
/// - `DELETE /subjects/{subject_id}/students/{student_id}` → `unenroll_student`
pub fn subjects_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subjects).post(create_subject))
        .route(
            "/{subject_id}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
        .route("/{subject_id}/schedules", get(list_schedules).post(add_schedule))
        .route("/{subject_id}/schedules/{schedule_id}", delete(delete_schedule))
        .route(
            "/{subject_id}/students",
            get(list_enrolled_students).post(enroll_students),
        )
        .route("/{subject_id}/students/{student_id}", delete(unenroll_student))
}
