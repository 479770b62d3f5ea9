use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::NaiveTime;
use db::models::system_settings::{self, SettingsPatch};
use serde::Deserialize;
use util::state::AppState;
use validator::{Validate, ValidationError};

use crate::auth::AuthUser;
use crate::response::{ApiResponse, service_error};
use crate::routes::common::format_validation_errors;

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_class_hours"))]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 0, max = 240, message = "Grace period must be between 0 and 240 minutes"))]
    pub grace_period_minutes: Option<i32>,
    #[validate(range(min = 1, max = 100, message = "Warning threshold must be between 1 and 100"))]
    pub warning_threshold: Option<i32>,
    #[validate(range(min = 0, max = 8760, message = "Warning cool-down must be between 0 and 8760 hours"))]
    pub warning_cooldown_hours: Option<i32>,
    pub email_notifications_enabled: Option<bool>,
    pub enable_time_validation: Option<bool>,
    #[validate(range(min = 0, max = 240, message = "Early attendance window must be between 0 and 240 minutes"))]
    pub early_attendance_minutes: Option<i32>,
    #[validate(range(min = 0, max = 240, message = "Late attendance window must be between 0 and 240 minutes"))]
    pub late_attendance_minutes: Option<i32>,
    #[validate(range(min = 0, max = 240, message = "Time-out lead must be between 0 and 240 minutes"))]
    pub timeout_before_minutes: Option<i32>,
    pub class_start_time: Option<NaiveTime>,
    pub class_end_time: Option<NaiveTime>,
}

fn validate_class_hours(req: &UpdateSettingsRequest) -> Result<(), ValidationError> {
    match (req.class_start_time, req.class_end_time) {
        (Some(start), Some(end)) if end <= start => Err(ValidationError::new("time_order")
            .with_message("Class end time must be after class start time".into())),
        _ => Ok(()),
    }
}

impl From<UpdateSettingsRequest> for SettingsPatch {
    fn from(req: UpdateSettingsRequest) -> Self {
        Self {
            grace_period_minutes: req.grace_period_minutes,
            warning_threshold: req.warning_threshold,
            warning_cooldown_hours: req.warning_cooldown_hours,
            email_notifications_enabled: req.email_notifications_enabled,
            enable_time_validation: req.enable_time_validation,
            early_attendance_minutes: req.early_attendance_minutes,
            late_attendance_minutes: req.late_attendance_minutes,
            timeout_before_minutes: req.timeout_before_minutes,
            class_start_time: req.class_start_time,
            class_end_time: req.class_end_time,
        }
    }
}

/// PUT /settings
///
/// Partial update; omitted fields keep their value.
///
/// ### Request Body
/// ```json
/// { "grace_period_minutes": 10, "warning_threshold": 4 }
/// ```
pub async fn update_settings(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateSettingsRequest>,
) -> (StatusCode, Json<ApiResponse<Option<system_settings::Model>>>) {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error_message)));
    }

    match system_settings::Model::apply(app_state.db(), req.into()).await {
        Ok(settings) => {
            tracing::info!(by = user.user_id, "System settings updated");
            (
                StatusCode::OK,
                Json(ApiResponse::success(Some(settings), "Settings updated successfully")),
            )
        }
        Err(e) => service_error(e.into()),
    }
}
