use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::calendar_event::{self, EventChanges};
use util::state::AppState;
use validator::Validate;

use super::common::{UpdateEventRequest, editable_event};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::format_validation_errors;

/// PUT /calendar/events/{event_id}
pub async fn update_event(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<i64>,
    Json(req): Json<UpdateEventRequest>,
) -> (StatusCode, Json<ApiResponse<Option<calendar_event::Model>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    let db = app_state.db();
    let event = match editable_event(db, &user, event_id).await {
        Ok(e) => e,
        Err(e) => return service_error(e),
    };

    let changes = EventChanges {
        title: req.title,
        date: req.date,
        event_type: req.event_type,
        description: req.description,
    };
    match event.update(db, changes).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(updated), "Event updated successfully")),
        ),
        Err(e) => service_error(e.into()),
    }
}
