//! Attendance derivation pass.
//!
//! Materializes ABSENT rows for every enrolled student that has no record for
//! a subject on a given date. Inserts go through the unique
//! `(student_id, subject_id, date)` index with `ON CONFLICT DO NOTHING`, so
//! concurrent or repeated passes never duplicate or overwrite a row.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    attendance_record::{self, NewRecord},
    calendar_event, enrollment, subject,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{error, info};
use util::email::Mailer;

use crate::error::{ServiceError, ServiceResult};
use crate::warning_service::{WarningOutcome, WarningService};

/// Which enrolled students a pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Only students advised by this user.
    Adviser(i64),
}

impl Scope {
    pub fn adviser_id(self) -> Option<i64> {
        match self {
            Scope::All => None,
            Scope::Adviser(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentNotification {
    pub student_id: i64,
    #[serde(flatten)]
    pub outcome: WarningOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct DerivationSummary {
    pub subject_id: i64,
    pub date: NaiveDate,
    pub enrolled: usize,
    pub already_recorded: usize,
    /// Students that received a new ABSENT row in this pass.
    pub created: Vec<i64>,
    pub notifications: Vec<StudentNotification>,
    /// Set when the date is in the future and nothing was derived.
    pub skipped_future_date: bool,
    /// Set when a holiday falls on the date and nothing was derived.
    pub skipped_holiday: bool,
}

pub struct DerivationService;

impl DerivationService {
    /// Fills in ABSENT rows for `subject_id` on `date`.
    ///
    /// `today` is the current local date; future dates and holidays are left
    /// alone. Each newly created row triggers the warning notifier. Notifier
    /// failures are logged and do not undo the rows already written.
    pub async fn derive_absences(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        subject_id: i64,
        date: NaiveDate,
        scope: Scope,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ServiceResult<DerivationSummary> {
        let subject = subject::Model::get_by_id(db, subject_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Subject not found".into()))?;

        let enrolled = enrollment::Model::student_ids_for_subject(db, subject.id, scope.adviser_id()).await?;
        let recorded: HashSet<i64> = attendance_record::Model::recorded_student_ids(db, subject.id, date)
            .await?
            .into_iter()
            .collect();

        let mut summary = DerivationSummary {
            subject_id: subject.id,
            date,
            enrolled: enrolled.len(),
            already_recorded: enrolled.iter().filter(|id| recorded.contains(id)).count(),
            created: Vec::new(),
            notifications: Vec::new(),
            skipped_future_date: false,
            skipped_holiday: false,
        };

        if date > today {
            summary.skipped_future_date = true;
            return Ok(summary);
        }
        if calendar_event::Model::is_holiday(db, subject.id, date).await? {
            summary.skipped_holiday = true;
            return Ok(summary);
        }

        for student_id in enrolled.into_iter().filter(|id| !recorded.contains(id)) {
            let created = attendance_record::Model::insert_if_absent(
                db,
                NewRecord::absent(student_id, subject.id, date),
            )
            .await?;
            if !created {
                // Another writer got there first.
                continue;
            }
            summary.created.push(student_id);

            match WarningService::check_and_notify(db, mailer, student_id, subject.id, now).await {
                Ok(outcome) => summary.notifications.push(StudentNotification { student_id, outcome }),
                Err(e) => error!(student_id, subject_id = subject.id, error = %e, "Warning check failed"),
            }
        }

        info!(
            subject_id = subject.id,
            %date,
            enrolled = summary.enrolled,
            already_recorded = summary.already_recorded,
            created = summary.created.len(),
            "Derivation pass finished"
        );
        Ok(summary)
    }
}
