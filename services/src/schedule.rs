//! Class-window resolution and PRESENT/LATE classification.
//!
//! A scan is matched against the subject's meeting slots for that day: dated
//! slots first, then weekly slots, then the subject's own start/end times.
//! A slot accepts scans from `start - early_attendance_minutes` until
//! `end + late_attendance_minutes`.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use db::models::{
    attendance_record::AttendanceStatus, subject, subject_schedule, system_settings,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    Dated,
    Weekly,
    Subject,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub source: WindowSource,
}

impl ClassWindow {
    fn accepts(&self, at: NaiveDateTime, settings: &system_settings::Model) -> bool {
        let date = at.date();
        let opens = date.and_time(self.start) - Duration::minutes(settings.early_attendance_minutes as i64);
        let closes = date.and_time(self.end) + Duration::minutes(settings.late_attendance_minutes as i64);
        at >= opens && at <= closes
    }

    /// Whether a scan at `at` falls in the time-out period of this window.
    pub fn is_time_out_period(&self, at: NaiveDateTime, settings: &system_settings::Model) -> bool {
        let from = at.date().and_time(self.end)
            - Duration::minutes(settings.timeout_before_minutes as i64);
        at >= from
    }
}

/// Picks the window a scan at `at` belongs to.
///
/// With no candidates the school-wide class hours apply and any time is
/// accepted. When time validation is off, the first candidate is used even if
/// the scan is outside it.
pub fn pick_window(
    candidates: &[ClassWindow],
    at: NaiveDateTime,
    settings: &system_settings::Model,
    subject_code: &str,
) -> ServiceResult<ClassWindow> {
    if candidates.is_empty() {
        return Ok(ClassWindow {
            start: settings.class_start_time,
            end: settings.class_end_time,
            source: WindowSource::Default,
        });
    }

    if let Some(found) = candidates.iter().find(|w| w.accepts(at, settings)) {
        return Ok(*found);
    }

    if !settings.enable_time_validation {
        return Ok(candidates[0]);
    }

    let windows = candidates
        .iter()
        .map(|w| format!("{}-{}", w.start.format("%H:%M"), w.end.format("%H:%M")))
        .collect::<Vec<_>>()
        .join(", ");
    Err(ServiceError::Validation(format!(
        "Attendance for {subject_code} is not open at {}. Scheduled: {windows} (scans accepted {} min early, {} min late).",
        at.format("%H:%M"),
        settings.early_attendance_minutes,
        settings.late_attendance_minutes,
    )))
}

/// Candidate windows for `subject` on the date of `at`.
pub async fn candidate_windows(
    db: &DatabaseConnection,
    subject: &subject::Model,
    at: NaiveDateTime,
) -> ServiceResult<Vec<ClassWindow>> {
    let slots = subject_schedule::Model::applicable_on(db, subject.id, at.date()).await?;
    if !slots.is_empty() {
        return Ok(slots
            .into_iter()
            .map(|s| ClassWindow {
                start: s.time_start,
                end: s.time_end,
                source: if s.date.is_some() {
                    WindowSource::Dated
                } else {
                    WindowSource::Weekly
                },
            })
            .collect());
    }

    Ok(match (subject.schedule_time_start, subject.schedule_time_end) {
        (Some(start), Some(end)) => vec![ClassWindow {
            start,
            end,
            source: WindowSource::Subject,
        }],
        _ => Vec::new(),
    })
}

pub async fn resolve_window(
    db: &DatabaseConnection,
    subject: &subject::Model,
    at: NaiveDateTime,
    settings: &system_settings::Model,
) -> ServiceResult<ClassWindow> {
    let candidates = candidate_windows(db, subject, at).await?;
    pick_window(&candidates, at, settings, &subject.code)
}

/// PRESENT unless the scan is at least `grace_period_minutes` after class start.
/// Returns the status and the whole minutes past start (never negative).
pub fn classify(
    at: NaiveDateTime,
    window: &ClassWindow,
    settings: &system_settings::Model,
) -> (AttendanceStatus, i64) {
    let minutes_late = (at - at.date().and_time(window.start)).num_minutes().max(0);
    let status = if minutes_late >= settings.grace_period_minutes as i64 {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    };
    (status, minutes_late)
}
