use chrono::{NaiveDate, NaiveTime};
use db::models::{subject, subject_schedule};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_subject_times"))]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 32, message = "Subject code is required"))]
    pub code: String,

    #[validate(length(min = 1, max = 200, message = "Subject name is required"))]
    pub name: String,

    pub schedule_days: Option<String>,
    pub schedule_time_start: Option<NaiveTime>,
    pub schedule_time_end: Option<NaiveTime>,

    /// Admin only; advisers always own the subjects they create.
    pub adviser_id: Option<i64>,
}

fn validate_subject_times(req: &CreateSubjectRequest) -> Result<(), ValidationError> {
    match (req.schedule_time_start, req.schedule_time_end) {
        (Some(start), Some(end)) if end <= start => Err(ValidationError::new("time_order")
            .with_message("End time must be after start time".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, max = 32, message = "Subject code cannot be empty"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Subject name cannot be empty"))]
    pub name: Option<String>,
    pub schedule_days: Option<String>,
    pub schedule_time_start: Option<NaiveTime>,
    pub schedule_time_end: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

/// A weekly slot (`day_of_week`, 0 = Monday) or a one-off slot (`date`).
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule"))]
pub struct ScheduleRequest {
    #[validate(range(min = 0, max = 6, message = "day_of_week must be 0 (Monday) to 6 (Sunday)"))]
    pub day_of_week: Option<i32>,
    pub date: Option<NaiveDate>,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

fn validate_schedule(req: &ScheduleRequest) -> Result<(), ValidationError> {
    if req.day_of_week.is_some() == req.date.is_some() {
        return Err(ValidationError::new("slot_kind")
            .with_message("Provide exactly one of day_of_week or date".into()));
    }
    if req.time_end <= req.time_start {
        return Err(ValidationError::new("time_order")
            .with_message("End time must be after start time".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub student_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Default)]
pub struct EnrollResponse {
    pub enrolled: Vec<i64>,
    pub already_enrolled: Vec<i64>,
    pub not_found: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubjectDetail {
    #[serde(flatten)]
    pub subject: subject::Model,
    pub schedules: Vec<subject_schedule::Model>,
    pub enrolled_count: usize,
}
