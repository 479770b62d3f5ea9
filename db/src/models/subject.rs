use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};

/// A class taught by an adviser. `(code, adviser_id)` is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub adviser_id: Option<i64>,
    /// Free-form meeting days, e.g. `MON,WED,FRI`. Informational only.
    pub schedule_days: Option<String>,
    pub schedule_time_start: Option<NaiveTime>,
    pub schedule_time_end: Option<NaiveTime>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AdviserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Adviser,
    #[sea_orm(has_many = "super::subject_schedule::Entity")]
    Schedules,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
}

impl Related<super::subject_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedules.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        super::enrollment::Relation::Student.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::enrollment::Relation::Subject.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub schedule_days: Option<String>,
    pub schedule_time_start: Option<NaiveTime>,
    pub schedule_time_end: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        code: &str,
        name: &str,
        adviser_id: Option<i64>,
        schedule_time_start: Option<NaiveTime>,
        schedule_time_end: Option<NaiveTime>,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            code: Set(code.trim().to_uppercase()),
            name: Set(name.to_string()),
            adviser_id: Set(adviser_id),
            schedule_days: Set(None),
            schedule_time_start: Set(schedule_time_start),
            schedule_time_end: Set(schedule_time_end),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Subjects visible to a caller: all for admins, own subjects for an adviser.
    pub async fn list(
        db: &DatabaseConnection,
        adviser_id: Option<i64>,
        active_only: bool,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = Entity::find();
        if let Some(adviser_id) = adviser_id {
            query = query.filter(Column::AdviserId.eq(adviser_id));
        }
        if active_only {
            query = query.filter(Column::IsActive.eq(true));
        }
        query.order_by_asc(Column::Code).all(db).await
    }

    pub async fn update(&self, db: &DatabaseConnection, changes: SubjectChanges) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        if let Some(code) = changes.code {
            active.code = Set(code.trim().to_uppercase());
        }
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(days) = changes.schedule_days {
            active.schedule_days = Set(Some(days).filter(|d| !d.trim().is_empty()));
        }
        if let Some(start) = changes.schedule_time_start {
            active.schedule_time_start = Set(Some(start));
        }
        if let Some(end) = changes.schedule_time_end {
            active.schedule_time_end = Set(Some(end));
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.update(db).await
    }

    pub async fn delete_by_id(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.adviser_id == Some(user_id)
    }
}
