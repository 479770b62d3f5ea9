use axum::{Json, extract::State, http::StatusCode};
use db::models::session_sweep;
use util::state::AppState;

use crate::response::{ApiResponse, service_error};

/// GET /admin/sessions/sweeps
///
/// The 50 most recent session sweeps.
pub async fn list_sweeps(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<session_sweep::Model>>>) {
    match session_sweep::Model::recent(app_state.db(), 50).await {
        Ok(sweeps) => (
            StatusCode::OK,
            Json(ApiResponse::success(sweeps, "Session sweeps retrieved successfully")),
        ),
        Err(e) => service_error(e.into()),
    }
}
