use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use db::models::calendar_event::{self, NewEvent};
use services::calendar_service::{CalendarService, CleanupReport};
use util::state::AppState;
use validator::Validate;

use super::common::{CleanupQuery, CreateEventRequest, check_event_access};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::format_validation_errors;

/// POST /calendar/events
///
/// ### Request Body
/// ```json
/// {
///   "title": "All Saints' Day",
///   "date": "2025-11-01",
///   "event_type": "holiday"
/// }
/// ```
///
/// ### Responses
/// - `201 Created`
/// - `400 Bad Request` - validation failure
/// - `403 Forbidden` - school-wide event from an adviser, or a subject they do not own
pub async fn create_event(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateEventRequest>,
) -> (StatusCode, Json<ApiResponse<Option<calendar_event::Model>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    let db = app_state.db();
    if let Err(e) = check_event_access(db, &user, req.subject_id).await {
        return service_error(e);
    }

    let new = NewEvent {
        title: req.title,
        date: req.date,
        event_type: req.event_type,
        description: req.description.unwrap_or_default(),
        subject_id: req.subject_id,
        created_by: Some(user.user_id),
    };
    match calendar_event::Model::create(db, new).await {
        Ok(event) => {
            tracing::info!(event_id = event.id, date = %event.date, by = user.user_id, "Calendar event created");
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(Some(event), "Event created successfully")),
            )
        }
        Err(e) => service_error(e.into()),
    }
}

/// POST /calendar/cleanup-holiday-absences?event_id=3
///
/// Removes derived ABSENT rows on holiday dates. Without `event_id` every
/// holiday is processed.
pub async fn cleanup_holiday_absences(
    State(app_state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> (StatusCode, Json<ApiResponse<CleanupReport>>) {
    match CalendarService::cleanup_holiday_absences(app_state.db(), query.event_id).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(report, "Holiday absences cleaned up")),
        ),
        Err(e) => service_error(e),
    }
}
