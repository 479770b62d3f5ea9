use chrono::{NaiveDate, NaiveTime};
use db::models::attendance_record;
use serde::{Deserialize, Serialize};
use services::derivation_service::DerivationSummary;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ScanRequest {
    #[validate(length(min = 1, message = "RFID tag is required"))]
    pub rfid_tag: String,
    pub subject_id: i64,
    /// Overrides the clock for back-filled scans. Defaults to now.
    pub manual_time: Option<NaiveTime>,
    /// Date for `manual_time`. Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub subject_id: i64,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// All visible subjects when omitted.
    pub subject_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct LogEntry {
    #[serde(flatten)]
    pub record: attendance_record::Model,
    pub student_name: String,
    pub student_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub derivation: DerivationSummary,
    pub records: Vec<LogEntry>,
}
