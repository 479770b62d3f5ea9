//! Holiday handling for derived absences.

use db::models::{attendance_record, calendar_event};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub holidays_checked: usize,
    pub records_removed: u64,
}

pub struct CalendarService;

impl CalendarService {
    /// Deletes derived ABSENT rows that fall on holidays.
    ///
    /// With `event_id` only that event is processed, and it must be a
    /// holiday. Rows with a time-in or time-out are never touched.
    pub async fn cleanup_holiday_absences(
        db: &DatabaseConnection,
        event_id: Option<i64>,
    ) -> ServiceResult<CleanupReport> {
        let holidays = match event_id {
            Some(id) => {
                let event = calendar_event::Model::get_by_id(db, id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Event not found".into()))?;
                if !event.is_holiday_event() {
                    return Err(ServiceError::Validation("Event is not a holiday".into()));
                }
                vec![event]
            }
            None => calendar_event::Model::holidays(db).await?,
        };

        let mut report = CleanupReport::default();
        for holiday in &holidays {
            report.holidays_checked += 1;
            report.records_removed +=
                attendance_record::Model::delete_derived_absences(db, holiday.date, holiday.subject_id).await?;
        }

        info!(
            holidays = report.holidays_checked,
            removed = report.records_removed,
            "Holiday absence cleanup finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, day};
    use db::models::attendance_record::AttendanceStatus;
    use db::models::calendar_event::{EventType, NewEvent};

    fn holiday(offset: i64, subject_id: Option<i64>, event_type: EventType) -> NewEvent {
        NewEvent {
            title: "Holiday".into(),
            date: day(offset),
            event_type,
            description: String::new(),
            subject_id,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_holiday_absences() {
        let fx = Fixture::new(2).await;
        fx.absent_on_days(fx.students[0].id, 3).await;
        calendar_event::Model::create(&fx.db, holiday(1, None, EventType::Holiday)).await.unwrap();
        calendar_event::Model::create(&fx.db, holiday(2, None, EventType::Event)).await.unwrap();

        let report = CalendarService::cleanup_holiday_absences(&fx.db, None).await.unwrap();
        assert_eq!(report.holidays_checked, 1);
        assert_eq!(report.records_removed, 1);

        let absences = attendance_record::Model::count_with_status(
            &fx.db,
            fx.students[0].id,
            fx.subject.id,
            AttendanceStatus::Absent,
        )
        .await
        .unwrap();
        assert_eq!(absences, 2);
    }

    #[tokio::test]
    async fn test_cleanup_single_event_must_be_holiday() {
        let fx = Fixture::new(1).await;
        let event = calendar_event::Model::create(&fx.db, holiday(0, None, EventType::Event)).await.unwrap();

        let err = CalendarService::cleanup_holiday_absences(&fx.db, Some(event.id)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = CalendarService::cleanup_holiday_absences(&fx.db, Some(9999)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        fx.absent_on_days(fx.students[0].id, 1).await;
        let own = calendar_event::Model::create(&fx.db, holiday(0, Some(fx.subject.id), EventType::Holiday))
            .await
            .unwrap();
        let report = CalendarService::cleanup_holiday_absences(&fx.db, Some(own.id)).await.unwrap();
        assert_eq!(report.records_removed, 1);
    }
}
