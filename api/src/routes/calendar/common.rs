use chrono::NaiveDate;
use db::models::calendar_event::{self, EventType};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use services::error::{ServiceError, ServiceResult};
use validator::Validate;

use crate::auth::AuthUser;
use crate::routes::common::owned_subject;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub date: NaiveDate,
    pub event_type: EventType,
    pub description: Option<String>,
    /// `None` makes the event school-wide, which only admins may do.
    pub subject_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub event_type: Option<EventType>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub event_id: Option<i64>,
}

/// School-wide events are admin territory; subject events belong to whoever
/// owns the subject.
pub async fn check_event_access(
    db: &DatabaseConnection,
    user: &AuthUser,
    subject_id: Option<i64>,
) -> ServiceResult<()> {
    match subject_id {
        Some(subject_id) => owned_subject(db, user, subject_id).await.map(|_| ()),
        None if user.is_admin() => Ok(()),
        None => Err(ServiceError::Forbidden(
            "Only admins can manage school-wide events".into(),
        )),
    }
}

/// Loads an event the caller may edit or delete.
pub async fn editable_event(
    db: &DatabaseConnection,
    user: &AuthUser,
    event_id: i64,
) -> ServiceResult<calendar_event::Model> {
    let event = calendar_event::Model::get_by_id(db, event_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Event not found".into()))?;
    check_event_access(db, user, event.subject_id).await?;
    Ok(event)
}
