use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use db::models::calendar_event;
use util::state::AppState;

use super::common::ListEventsQuery;
use crate::response::{ApiResponse, service_error};

/// GET /calendar/events?from=2025-11-01&to=2025-11-30&type=holiday
///
/// Newest first. Every staff member sees the whole calendar.
pub async fn list_events(
    State(app_state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<calendar_event::Model>>>) {
    match calendar_event::Model::list(app_state.db(), query.from, query.to, query.event_type).await {
        Ok(events) => (
            StatusCode::OK,
            Json(ApiResponse::success(events, "Events retrieved successfully")),
        ),
        Err(e) => service_error(e.into()),
    }
}
