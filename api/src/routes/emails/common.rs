use db::models::email_log::{EmailStatus, EmailType};
use serde::Deserialize;
use validator::Validate;

pub const DEFAULT_LOG_LIMIT: u64 = 100;
pub const MAX_LOG_LIMIT: u64 = 500;
pub const MAX_EXPORT_ROWS: u64 = 10_000;

#[derive(Debug, Deserialize, Validate)]
pub struct BulkEmailRequest {
    #[validate(length(min = 1, message = "Select at least one student"))]
    pub student_ids: Vec<i64>,

    #[validate(length(min = 1, max = 100, message = "Term label is required"))]
    pub term_label: String,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(rename = "type")]
    pub email_type: Option<EmailType>,
    pub status: Option<EmailStatus>,
    pub limit: Option<u64>,
}

impl LogsQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
    }

    pub fn export_limit(&self) -> u64 {
        self.limit.unwrap_or(MAX_EXPORT_ROWS).clamp(1, MAX_EXPORT_ROWS)
    }
}
