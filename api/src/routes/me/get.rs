use axum::{Extension, Json, extract::State, http::StatusCode};
use db::models::{attendance_record, enrollment, student};
use serde::Serialize;
use services::error::{ServiceError, ServiceResult};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::students::common::{StudentSubjectSummary, tally};

#[derive(Debug, Serialize)]
pub struct MyAttendance {
    pub student: student::Model,
    pub subjects: Vec<StudentSubjectSummary>,
    /// Newest first.
    pub records: Vec<attendance_record::Model>,
}

async fn load(app_state: &AppState, user: &AuthUser) -> ServiceResult<MyAttendance> {
    let db = app_state.db();
    let mut me = student::Model::find_by_user_id(db, user.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("No student profile is linked to this account".into()))?;
    if !user.show_photo {
        me.profile_picture_path = None;
    }

    let records = attendance_record::Model::for_student(db, me.id, None).await?;
    let mut subjects: Vec<StudentSubjectSummary> = enrollment::Model::subjects_for_student(db, me.id)
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

    Ok(MyAttendance { student: me, subjects, records })
}

/// GET /me/attendance
///
/// The caller's own records plus present/late/absent counts per enrolled subject.
pub async fn get_my_attendance(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Option<MyAttendance>>>) {
    match load(&app_state, &user).await {
        Ok(data) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(data), "Attendance retrieved successfully")),
        ),
        Err(e) => service_error(e),
    }
}
