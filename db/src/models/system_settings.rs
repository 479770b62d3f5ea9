use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};
use serde::{Deserialize, Serialize};

/// Primary key of the one and only settings row.
pub const SETTINGS_ID: i64 = 1;

/// Runtime-tunable attendance policy. Exactly one row exists (id = 1).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Minutes after class start a scan still counts as PRESENT.
    pub grace_period_minutes: i32,
    /// Cumulative absences per subject that trigger a warning email.
    pub warning_threshold: i32,
    /// Minimum gap between two warning emails for the same student and subject.
    pub warning_cooldown_hours: i32,
    pub email_notifications_enabled: bool,
    pub enable_time_validation: bool,
    /// How early before class start a scan is accepted.
    pub early_attendance_minutes: i32,
    /// How late after class end a scan is accepted.
    pub late_attendance_minutes: i32,
    /// Time-out scans are accepted from this many minutes before class end.
    pub timeout_before_minutes: i32,
    pub class_start_time: NaiveTime,
    pub class_end_time: NaiveTime,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub grace_period_minutes: Option<i32>,
    pub warning_threshold: Option<i32>,
    pub warning_cooldown_hours: Option<i32>,
    pub email_notifications_enabled: Option<bool>,
    pub enable_time_validation: Option<bool>,
    pub early_attendance_minutes: Option<i32>,
    pub late_attendance_minutes: Option<i32>,
    pub timeout_before_minutes: Option<i32>,
    pub class_start_time: Option<NaiveTime>,
    pub class_end_time: Option<NaiveTime>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID,
            grace_period_minutes: 15,
            warning_threshold: 3,
            warning_cooldown_hours: 168,
            email_notifications_enabled: true,
            enable_time_validation: true,
            early_attendance_minutes: 30,
            late_attendance_minutes: 60,
            timeout_before_minutes: 15,
            class_start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            class_end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            updated_at: None,
        }
    }
}

impl Model {
    /// Loads the settings row, recreating it with defaults if it was removed.
    pub async fn load(db: &DatabaseConnection) -> Result<Self, DbErr> {
        if let Some(found) = Entity::find_by_id(SETTINGS_ID).one(db).await? {
            return Ok(found);
        }

        let defaults = Self::default();
        let mut active: ActiveModel = defaults.into();
        active.updated_at = NotSet;
        active.insert(db).await
    }

    pub async fn apply(db: &DatabaseConnection, patch: SettingsPatch) -> Result<Self, DbErr> {
        let current = Self::load(db).await?;
        let mut active: ActiveModel = current.into();

        macro_rules! patch_field {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = patch.$field {
                    active.$field = Set(v);
                })*
            };
        }
        patch_field!(
            grace_period_minutes,
            warning_threshold,
            warning_cooldown_hours,
            email_notifications_enabled,
            enable_time_validation,
            early_attendance_minutes,
            late_attendance_minutes,
            timeout_before_minutes,
            class_start_time,
            class_end_time,
        );
        active.updated_at = Set(Some(Utc::now()));
        active.update(db).await
    }
}
