use db::models::{attendance_record::AttendanceStatus, student};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 64, message = "RFID tag must be 1-64 characters"))]
    pub rfid_tag: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Student number must be 1-64 characters"))]
    pub student_number: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub email_opt_in: Option<bool>,

    /// Ignored for advisers, who always own the students they create.
    pub adviser_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 200, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub rfid_tag: Option<String>,
    pub student_number: Option<String>,
    /// An empty string removes the address.
    pub email: Option<String>,
    pub email_opt_in: Option<bool>,
    pub adviser_id: Option<i64>,
    pub profile_picture_path: Option<String>,
}

impl UpdateStudentRequest {
    /// Email must be empty (to clear) or a valid address.
    pub fn email_is_valid(&self) -> bool {
        match self.email.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(e) => e.validate_email(),
        }
    }
}

/// Columns shared by the registry export and import.
pub const REGISTRY_COLUMNS: [&str; 6] = ["rfid_tag", "student_number", "name", "email", "email_opt_in", "adviser"];

#[derive(Debug, Deserialize)]
pub struct ImportStudentsRequest {
    pub csv_data: String,
}

#[derive(Debug, Serialize, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Reads an opt-in cell. Missing means opted in.
pub fn parse_opt_in(value: Option<&str>) -> Result<bool, String> {
    match value.map(str::to_lowercase).as_deref() {
        None | Some("true" | "yes" | "1") => Ok(true),
        Some("false" | "no" | "0") => Ok(false),
        Some(other) => Err(format!("invalid email_opt_in '{other}'")),
    }
}

#[derive(Debug, Serialize, Default)]
pub struct StudentSubjectSummary {
    pub subject_id: i64,
    pub code: String,
    pub name: String,
    pub present: u64,
    pub late: u64,
    pub absent: u64,
}

#[derive(Debug, Serialize)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: student::Model,
    pub subjects: Vec<StudentSubjectSummary>,
}

pub fn tally(status: AttendanceStatus, summary: &mut StudentSubjectSummary) {
    match status {
        AttendanceStatus::Present => summary.present += 1,
        AttendanceStatus::Late => summary.late += 1,
        AttendanceStatus::Absent => summary.absent += 1,
    }
}
