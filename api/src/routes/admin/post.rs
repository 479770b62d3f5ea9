use axum::{Extension, Json, extract::State, http::StatusCode};
use db::models::session_sweep::SweepReason;
use serde::Serialize;
use services::session_service::SessionService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};

#[derive(Debug, Serialize, Default)]
pub struct SweepResponse {
    pub sessions_removed: u64,
    pub audit_id: i64,
}

/// POST /admin/sessions/sweep
///
/// Logs everyone out, the caller included, and records an audit row.
pub async fn sweep_sessions(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<SweepResponse>>) {
    match SessionService::sweep_all(app_state.db(), SweepReason::Admin, Some(user.user_id)).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SweepResponse {
                    sessions_removed: report.removed,
                    audit_id: report.audit_id,
                },
                format!("Invalidated {} session(s)", report.removed),
            )),
        ),
        Err(e) => service_error(e),
    }
}
