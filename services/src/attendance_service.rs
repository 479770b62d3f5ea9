//! RFID scans and manual attendance entry.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use db::models::{
    attendance_record::{self, ActiveModel as RecordActive, AttendanceStatus, NewRecord},
    email_log::EmailType,
    enrollment, student, subject, system_settings,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use util::email::Mailer;

use crate::email_service::{Delivery, EmailService};
use crate::error::{ServiceError, ServiceResult};
use crate::schedule::{self, ClassWindow};
use crate::warning_service::{WarningOutcome, WarningService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    TimeIn,
    TimeOut,
    /// Already timed in and too early to time out.
    AlreadyTimedIn,
    /// Time-in and time-out are both recorded for today.
    AlreadyComplete,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub action: ScanAction,
    pub record: attendance_record::Model,
    pub student: student::Model,
    pub subject: subject::Model,
    pub window: Option<ClassWindow>,
    pub minutes_late: i64,
    pub confirmation: Option<Delivery>,
}

impl ScanResult {
    pub fn message(&self) -> String {
        let fmt = |t: Option<NaiveTime>| t.map(|t| t.format("%I:%M %p").to_string()).unwrap_or_else(|| "N/A".into());
        match self.action {
            ScanAction::TimeIn => format!(
                "Time In recorded! {} - {} at {}",
                self.student.name,
                self.record.status,
                fmt(self.record.time_in)
            ),
            ScanAction::TimeOut => format!(
                "Time Out recorded! {} - Time In: {}, Time Out: {}",
                self.student.name,
                fmt(self.record.time_in),
                fmt(self.record.time_out)
            ),
            ScanAction::AlreadyTimedIn => format!(
                "{} already timed in at {} for {}",
                self.student.name,
                fmt(self.record.time_in),
                self.subject.code
            ),
            ScanAction::AlreadyComplete => format!(
                "You already have time in and time out recorded for today. Time In: {}, Time Out: {}",
                fmt(self.record.time_in),
                fmt(self.record.time_out)
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualEntry {
    pub student_id: i64,
    pub subject_id: i64,
    pub date: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    #[serde(default)]
    pub skip_validation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualAction {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualResult {
    pub action: ManualAction,
    pub record: attendance_record::Model,
    pub warning: Option<WarningOutcome>,
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

pub struct AttendanceService;

impl AttendanceService {
    /// Records an RFID scan for `subject_id` at local time `at`.
    ///
    /// The first scan of the day sets time-in with PRESENT or LATE. A later
    /// scan from `timeout_before_minutes` before class end sets time-out.
    /// Time-in is never overwritten by a re-scan.
    pub async fn scan(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        rfid_tag: &str,
        subject_id: i64,
        at: NaiveDateTime,
    ) -> ServiceResult<ScanResult> {
        let rfid_tag = rfid_tag.trim();
        if rfid_tag.is_empty() {
            return Err(ServiceError::Validation("RFID tag is required".into()));
        }

        let student = student::Model::find_by_rfid(db, rfid_tag)
            .await?
            .ok_or_else(|| ServiceError::NotFound("RFID card not recognized".into()))?;
        let subject = subject::Model::get_by_id(db, subject_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Subject not found".into()))?;

        if !enrollment::Model::is_enrolled(db, student.id, subject.id).await? {
            let enrolled = enrollment::Model::subjects_for_student(db, student.id).await?;
            let list = if enrolled.is_empty() {
                "none".to_string()
            } else {
                enrolled.iter().map(|s| s.code.as_str()).collect::<Vec<_>>().join(", ")
            };
            return Err(ServiceError::Validation(format!(
                "{} is not enrolled in {}. Enrolled subjects: {}",
                student.name, subject.code, list
            )));
        }

        let settings = system_settings::Model::load(db).await?;
        let date = at.date();
        let stored_time = truncate_to_minute(at.time());

        let existing = attendance_record::Model::find_for(db, student.id, subject.id, date).await?;
        if let Some(rec) = &existing {
            if rec.time_in.is_some() && rec.time_out.is_some() {
                return Ok(ScanResult {
                    action: ScanAction::AlreadyComplete,
                    record: rec.clone(),
                    student,
                    subject,
                    window: None,
                    minutes_late: 0,
                    confirmation: None,
                });
            }
        }

        let window = schedule::resolve_window(db, &subject, at, &settings).await?;
        let (status, minutes_late) = schedule::classify(at, &window, &settings);

        let (action, record) = match existing {
            None => {
                let created = attendance_record::Model::insert_if_absent(
                    db,
                    NewRecord {
                        time_in: Some(stored_time),
                        status,
                        ..NewRecord::absent(student.id, subject.id, date)
                    },
                )
                .await?;
                let rec = attendance_record::Model::find_for(db, student.id, subject.id, date)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Attendance record vanished".into()))?;
                if created {
                    (ScanAction::TimeIn, rec)
                } else {
                    // Lost a race with another writer; treat the row as pre-existing.
                    Self::apply_scan_to_existing(db, rec, stored_time, status, at, &window, &settings).await?
                }
            }
            Some(rec) => Self::apply_scan_to_existing(db, rec, stored_time, status, at, &window, &settings).await?,
        };

        info!(
            student_id = student.id,
            subject_id = subject.id,
            %date,
            action = ?action,
            status = %record.status,
            "RFID scan processed"
        );

        let confirmation = match action {
            ScanAction::TimeIn | ScanAction::TimeOut if settings.email_notifications_enabled => {
                Self::send_confirmation(db, mailer, &student, &subject, &record, action).await
            }
            _ => None,
        };

        Ok(ScanResult {
            action,
            record,
            student,
            subject,
            window: Some(window),
            minutes_late: if action == ScanAction::TimeIn { minutes_late } else { 0 },
            confirmation,
        })
    }

    async fn apply_scan_to_existing(
        db: &DatabaseConnection,
        rec: attendance_record::Model,
        stored_time: NaiveTime,
        status: AttendanceStatus,
        at: NaiveDateTime,
        window: &ClassWindow,
        settings: &system_settings::Model,
    ) -> ServiceResult<(ScanAction, attendance_record::Model)> {
        match (rec.time_in, rec.time_out) {
            (Some(_), Some(_)) => Ok((ScanAction::AlreadyComplete, rec)),
            (Some(_), None) if window.is_time_out_period(at, settings) => {
                let mut active: RecordActive = rec.into();
                active.time_out = Set(Some(stored_time));
                active.updated_at = Set(Utc::now());
                Ok((ScanAction::TimeOut, active.update(db).await?))
            }
            (Some(_), None) => Ok((ScanAction::AlreadyTimedIn, rec)),
            (None, _) => {
                // Usually a derived ABSENT row; the student showed up after all.
                let mut active: RecordActive = rec.into();
                active.time_in = Set(Some(stored_time));
                active.status = Set(status);
                active.updated_at = Set(Utc::now());
                Ok((ScanAction::TimeIn, active.update(db).await?))
            }
        }
    }

    async fn send_confirmation(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        student: &student::Model,
        subject: &subject::Model,
        record: &attendance_record::Model,
        action: ScanAction,
    ) -> Option<Delivery> {
        let to = student.notification_address()?;
        let fmt = |t: Option<NaiveTime>| t.map(|t| t.format("%I:%M %p").to_string()).unwrap_or_else(|| "N/A".into());

        let (kind, time_out_line) = match action {
            ScanAction::TimeOut => ("Check-Out", format!("Time Out: {}\n", fmt(record.time_out))),
            _ => ("Check-In", String::new()),
        };
        let subject_line = format!("Attendance {kind} Confirmation - {}", subject.code);
        let body = format!(
            "Dear {name},\n\n\
             Your attendance has been recorded for {code} - {title}.\n\n\
             Date: {date}\n\
             Time In: {time_in}\n\
             {time_out_line}\
             Status: {status}\n\n\
             Thank you for your attendance.\n\n\
             Best regards,\n\
             Attendance Monitoring System",
            name = student.name,
            code = subject.code,
            title = subject.name,
            date = record.date.format("%B %d, %Y"),
            time_in = fmt(record.time_in),
            status = record.status,
        );

        match EmailService::deliver(db, mailer, student.id, Some(subject.id), EmailType::Confirmation, to, &subject_line, &body).await {
            Ok(log) => Some(Delivery::from(&log)),
            Err(e) => {
                warn!(student_id = student.id, error = %e, "Could not log confirmation email");
                None
            }
        }
    }

    /// Creates or corrects a record by hand.
    ///
    /// Existing rows are updated only where the given values differ. A write
    /// that leaves the row ABSENT when it was not ABSENT before runs the
    /// warning notifier.
    pub async fn manual_entry(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        entry: ManualEntry,
    ) -> ServiceResult<ManualResult> {
        let student = student::Model::get_by_id(db, entry.student_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Student not found".into()))?;
        let subject = subject::Model::get_by_id(db, entry.subject_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Subject not found".into()))?;
        if !enrollment::Model::is_enrolled(db, student.id, subject.id).await? {
            return Err(ServiceError::Validation(format!(
                "{} is not enrolled in {}",
                student.name, subject.code
            )));
        }

        let time_in = entry.time_in.map(truncate_to_minute);
        let time_out = entry.time_out.map(truncate_to_minute);
        if let (Some(i), Some(o)) = (time_in, time_out) {
            if o < i {
                return Err(ServiceError::Validation("Time out cannot be earlier than time in".into()));
            }
        }

        let settings = system_settings::Model::load(db).await?;
        if let Some(t) = time_in {
            if !entry.skip_validation && settings.enable_time_validation {
                schedule::resolve_window(db, &subject, entry.date.and_time(t), &settings).await?;
            }
        }

        let notes = entry.notes.clone().unwrap_or_default();
        let created = attendance_record::Model::insert_if_absent(
            db,
            NewRecord {
                student_id: student.id,
                subject_id: subject.id,
                date: entry.date,
                time_in,
                time_out,
                status: entry.status,
                notes: notes.clone(),
            },
        )
        .await?;

        let current = attendance_record::Model::find_for(db, student.id, subject.id, entry.date)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Attendance record vanished".into()))?;

        let (action, record, was_absent) = if created {
            (ManualAction::Created, current, false)
        } else {
            let was_absent = current.status == AttendanceStatus::Absent;
            let mut active: RecordActive = current.clone().into();
            let mut changed = false;
            if current.time_in != time_in {
                active.time_in = Set(time_in);
                changed = true;
            }
            if current.time_out != time_out {
                active.time_out = Set(time_out);
                changed = true;
            }
            if current.status != entry.status {
                active.status = Set(entry.status);
                changed = true;
            }
            if entry.notes.is_some() && current.notes != notes {
                active.notes = Set(notes);
                changed = true;
            }

            if changed {
                active.updated_at = Set(Utc::now());
                (ManualAction::Updated, active.update(db).await?, was_absent)
            } else {
                (ManualAction::Unchanged, current, was_absent)
            }
        };

        info!(
            student_id = student.id,
            subject_id = subject.id,
            date = %entry.date,
            action = ?action,
            status = %record.status,
            "Manual attendance entry"
        );

        let warning = if record.status == AttendanceStatus::Absent && !was_absent && action != ManualAction::Unchanged {
            Some(WarningService::check_and_notify(db, mailer, student.id, subject.id, Utc::now()).await?)
        } else {
            None
        };

        Ok(ManualResult { action, record, warning })
    }
}
