//! Logged email delivery.
//!
//! Every send goes through [`EmailService::deliver`], which writes a PENDING
//! `email_logs` row, hands the message to the [`Mailer`] and then flips the row
//! to SENT or FAILED. A transport failure is never returned as an error; it is
//! recorded on the log row and reported back to the caller.

use chrono::Utc;
use db::models::{
    attendance_record::{self, AttendanceStatus},
    email_log::{self, EmailStatus, EmailType},
    enrollment, student, system_settings,
};
use futures::stream::{self, StreamExt};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{error, info};
use util::email::{Mailer, OutgoingEmail};

use crate::error::{ServiceError, ServiceResult};

/// Upper bound on simultaneous SMTP conversations during bulk sends.
pub const BULK_SEND_CONCURRENCY: usize = 5;

/// Outcome of one delivery attempt, as stored in the log.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub log_id: i64,
    pub email_to: String,
    pub sent: bool,
    pub error: Option<String>,
}

impl From<&email_log::Model> for Delivery {
    fn from(log: &email_log::Model) -> Self {
        Self {
            log_id: log.id,
            email_to: log.email_to.clone(),
            sent: log.status == EmailStatus::Sent,
            error: log.error_message.clone(),
        }
    }
}

/// What a bulk send did for one student.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BulkItem {
    Sent { student_id: i64, log_id: i64 },
    Failed { student_id: i64, log_id: i64, error: String },
    Skipped { student_id: i64, reason: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub items: Vec<BulkItem>,
}

pub struct EmailService;

impl EmailService {
    #[allow(clippy::too_many_arguments)]
    pub async fn deliver(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        student_id: i64,
        subject_id: Option<i64>,
        email_type: EmailType,
        to: &str,
        subject_line: &str,
        body: &str,
    ) -> ServiceResult<email_log::Model> {
        let log = email_log::Model::create_pending(
            db,
            student_id,
            subject_id,
            to,
            subject_line,
            body,
            email_type,
        )
        .await?;

        Self::attempt(db, mailer, log).await
    }

    /// Sends the content of an existing log row again and updates that row.
    pub async fn resend(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        log_id: i64,
    ) -> ServiceResult<email_log::Model> {
        let log = email_log::Model::get_by_id(db, log_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Email log not found".into()))?;

        Self::attempt(db, mailer, log).await
    }

    async fn attempt(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        log: email_log::Model,
    ) -> ServiceResult<email_log::Model> {
        let email = OutgoingEmail::plain(&log.email_to, &log.subject_line, &log.body);

        match mailer.send(&email).await {
            Ok(()) => {
                info!(
                    log_id = log.id,
                    student_id = log.student_id,
                    email_type = %log.email_type,
                    to = %log.email_to,
                    "Email sent"
                );
                Ok(log.mark_sent(db, Utc::now()).await?)
            }
            Err(e) => {
                error!(
                    log_id = log.id,
                    student_id = log.student_id,
                    email_type = %log.email_type,
                    to = %log.email_to,
                    error = %e,
                    "Email delivery failed"
                );
                Ok(log.mark_failed(db, &e.to_string()).await?)
            }
        }
    }

    /// Builds the per-subject attendance summary email for a student.
    pub async fn semester_summary(
        db: &DatabaseConnection,
        student: &student::Model,
        term_label: &str,
    ) -> ServiceResult<(String, String)> {
        let subjects = enrollment::Model::subjects_for_student(db, student.id).await?;

        let mut lines = Vec::with_capacity(subjects.len());
        let (mut total_present, mut total_late, mut total_absent) = (0u64, 0u64, 0u64);
        for subj in &subjects {
            let present = attendance_record::Model::count_with_status(db, student.id, subj.id, AttendanceStatus::Present).await?;
            let late = attendance_record::Model::count_with_status(db, student.id, subj.id, AttendanceStatus::Late).await?;
            let absent = attendance_record::Model::count_with_status(db, student.id, subj.id, AttendanceStatus::Absent).await?;
            total_present += present;
            total_late += late;
            total_absent += absent;
            lines.push(format!(
                "- {} {}: {} present, {} late, {} absent",
                subj.code, subj.name, present, late, absent
            ));
        }

        let subject_line = format!("Attendance Report - {term_label}");
        let body = format!(
            "Dear {name},\n\n\
             Here is your attendance summary for {term_label}.\n\n\
             {details}\n\n\
             Totals: {total_present} present, {total_late} late, {total_absent} absent.\n\n\
             If you believe any record is incorrect, please contact your adviser.\n\n\
             Best regards,\n\
             Attendance Monitoring System",
            name = student.name,
            details = if lines.is_empty() {
                "You are not enrolled in any subjects.".to_string()
            } else {
                lines.join("\n")
            },
        );

        Ok((subject_line, body))
    }

    /// Sends the semester summary to each student, at most
    /// [`BULK_SEND_CONCURRENCY`] at a time. Opted-out students and students
    /// without an address are skipped.
    pub async fn bulk_send_summaries(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        students: Vec<student::Model>,
        term_label: &str,
    ) -> ServiceResult<BulkReport> {
        let settings = system_settings::Model::load(db).await?;
        if !settings.email_notifications_enabled {
            return Err(ServiceError::Validation(
                "Email notifications are currently disabled in system settings.".into(),
            ));
        }

        let results: Vec<ServiceResult<BulkItem>> = stream::iter(students)
            .map(|s| async move {
                let Some(to) = s.notification_address().map(str::to_string) else {
                    let reason = if s.email_opt_in { "no email address" } else { "opted out" };
                    return Ok(BulkItem::Skipped {
                        student_id: s.id,
                        reason: reason.into(),
                    });
                };

                let (subject_line, body) = Self::semester_summary(db, &s, term_label).await?;
                let log = Self::deliver(db, mailer, s.id, None, EmailType::Semester, &to, &subject_line, &body).await?;

                Ok(match log.status {
                    EmailStatus::Sent => BulkItem::Sent {
                        student_id: s.id,
                        log_id: log.id,
                    },
                    _ => BulkItem::Failed {
                        student_id: s.id,
                        log_id: log.id,
                        error: log.error_message.unwrap_or_default(),
                    },
                })
            })
            .buffer_unordered(BULK_SEND_CONCURRENCY)
            .collect()
            .await;

        let mut report = BulkReport::default();
        for item in results {
            let item = item?;
            match item {
                BulkItem::Sent { .. } => report.sent += 1,
                BulkItem::Failed { .. } => report.failed += 1,
                BulkItem::Skipped { .. } => report.skipped += 1,
            }
            report.items.push(item);
        }

        info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "Bulk summary send finished"
        );
        Ok(report)
    }
}
