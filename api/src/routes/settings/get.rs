use axum::{Json, extract::State, http::StatusCode};
use db::models::system_settings;
use util::state::AppState;

use crate::response::{ApiResponse, service_error};

/// GET /settings
pub async fn get_settings(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<system_settings::Model>>) {
    match system_settings::Model::load(app_state.db()).await {
        Ok(settings) => (
            StatusCode::OK,
            Json(ApiResponse::success(settings, "Settings retrieved successfully")),
        ),
        Err(e) => service_error(e.into()),
    }
}
