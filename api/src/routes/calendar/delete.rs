use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::calendar_event;
use util::state::AppState;

use super::common::editable_event;
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};

/// DELETE /calendar/events/{event_id}
///
/// Deleting a holiday does not bring back absences that were cleaned up.
pub async fn delete_event(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = app_state.db();
    if let Err(e) = editable_event(db, &user, event_id).await {
        return service_error(e);
    }

    match calendar_event::Model::delete_by_id(db, event_id).await {
        Ok(_) => {
            tracing::info!(event_id, by = user.user_id, "Calendar event deleted");
            (StatusCode::OK, Json(ApiResponse::success((), "Event deleted successfully")))
        }
        Err(e) => service_error(e.into()),
    }
}
