//! Absence warning notifier.
//!
//! Runs after every write that leaves a record ABSENT. Once a student's
//! cumulative absences in a subject reach `warning_threshold`, one warning
//! email goes out, and no further warning for the same student and subject is
//! sent until `warning_cooldown_hours` have passed since the last successful
//! one. Failed sends do not start a cool-down.

use chrono::{DateTime, Duration, Utc};
use db::models::{
    attendance_record::{self, AttendanceStatus},
    email_log::{self, EmailStatus, EmailType},
    enrollment, student, subject, system_settings,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info, warn};
use util::email::Mailer;

use crate::email_service::EmailService;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WarningOutcome {
    /// Email notifications are switched off in settings.
    Disabled,
    /// No address on file, or the student opted out.
    NoRecipient,
    NotEnrolled,
    BelowThreshold { absences: u64 },
    CoolingDown { absences: u64, last_sent_at: DateTime<Utc> },
    Sent { absences: u64, log_id: i64 },
    Failed { absences: u64, log_id: i64, error: String },
}

pub struct WarningService;

impl WarningService {
    pub async fn check_and_notify(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        student_id: i64,
        subject_id: i64,
        now: DateTime<Utc>,
    ) -> ServiceResult<WarningOutcome> {
        let settings = system_settings::Model::load(db).await?;
        if !settings.email_notifications_enabled {
            return Ok(WarningOutcome::Disabled);
        }

        let student = student::Model::get_by_id(db, student_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Student not found".into()))?;
        let Some(to) = student.notification_address().map(str::to_string) else {
            return Ok(WarningOutcome::NoRecipient);
        };

        if !enrollment::Model::is_enrolled(db, student_id, subject_id).await? {
            return Ok(WarningOutcome::NotEnrolled);
        }

        let absences = attendance_record::Model::count_with_status(
            db,
            student_id,
            subject_id,
            AttendanceStatus::Absent,
        )
        .await?;
        let threshold = settings.warning_threshold.max(1) as u64;
        if absences < threshold {
            debug!(student_id, subject_id, absences, threshold, "Below warning threshold");
            return Ok(WarningOutcome::BelowThreshold { absences });
        }

        let since = now - Duration::hours(settings.warning_cooldown_hours as i64);
        if let Some(last) = email_log::Model::last_sent_since(db, student_id, subject_id, EmailType::Warning, since).await? {
            let last_sent_at = last.sent_at.unwrap_or(last.created_at);
            debug!(student_id, subject_id, absences, %last_sent_at, "Warning suppressed by cool-down");
            return Ok(WarningOutcome::CoolingDown { absences, last_sent_at });
        }

        let subject = subject::Model::get_by_id(db, subject_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Subject not found".into()))?;
        let (subject_line, body) = compose(&student, &subject, absences, threshold);

        let log = EmailService::deliver(
            db,
            mailer,
            student_id,
            Some(subject_id),
            EmailType::Warning,
            &to,
            &subject_line,
            &body,
        )
        .await?;

        if log.status == EmailStatus::Sent {
            info!(student_id, subject_id, absences, log_id = log.id, "Absence warning sent");
            Ok(WarningOutcome::Sent { absences, log_id: log.id })
        } else {
            let error = log.error_message.clone().unwrap_or_default();
            warn!(student_id, subject_id, absences, log_id = log.id, %error, "Absence warning could not be delivered");
            Ok(WarningOutcome::Failed { absences, log_id: log.id, error })
        }
    }
}

fn compose(student: &student::Model, subject: &subject::Model, absences: u64, threshold: u64) -> (String, String) {
    let subject_line = format!("Attendance Warning - {}", subject.code);
    let body = format!(
        "Dear {name},\n\n\
         This is an automated warning regarding your attendance in {code} - {title}.\n\n\
         You have accumulated {absences} absence(s), which has reached or exceeded the warning threshold of {threshold} absence(s).\n\n\
         Continued absences may affect your academic standing. Please attend all scheduled classes \
         and contact your instructor if you have valid reasons for your absences.\n\n\
         Current Absences: {absences}\n\
         Warning Threshold: {threshold}\n\n\
         Best regards,\n\
         Attendance Monitoring System",
        name = student.name,
        code = subject.code,
        title = subject.name,
    );
    (subject_line, body)
}
