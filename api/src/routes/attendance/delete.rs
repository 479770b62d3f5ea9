use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::attendance_record;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};

/// DELETE /attendance/{record_id}
///
/// Admin correction. A deleted ABSENT row is re-derived the next time the
/// log for that day is viewed.
pub async fn delete_record(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(record_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    match attendance_record::Model::delete_by_id(app_state.db(), record_id).await {
        Ok(true) => {
            tracing::info!(record_id, by = user.user_id, "Attendance record deleted");
            (StatusCode::OK, Json(ApiResponse::success((), "Attendance record deleted successfully")))
        }
        Ok(false) => (StatusCode::NOT_FOUND, Json(ApiResponse::error("Attendance record not found"))),
        Err(e) => service_error(e.into()),
    }
}
