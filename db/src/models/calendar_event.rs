use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A dated calendar entry. Holidays suspend classes: no absences are derived
/// on them and derived absences already on file can be cleaned up.
///
/// `subject_id = None` makes the event school-wide.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "calendar_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub event_type: EventType,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub subject_id: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "calendar_event_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventType {
    #[sea_orm(string_value = "holiday")]
    Holiday,
    #[sea_orm(string_value = "event")]
    Event,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id",
        on_delete = "Cascade"
    )]
    Subject,
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub event_type: EventType,
    pub description: String,
    pub subject_id: Option<i64>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub event_type: Option<EventType>,
    pub description: Option<String>,
}

impl Model {
    pub async fn create(db: &DatabaseConnection, new: NewEvent) -> Result<Self, DbErr> {
        let active = ActiveModel {
            title: Set(new.title.trim().to_string()),
            date: Set(new.date),
            event_type: Set(new.event_type),
            description: Set(new.description),
            subject_id: Set(new.subject_id),
            created_by: Set(new.created_by),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Events between `from` and `to` inclusive, newest first.
    pub async fn list(
        db: &DatabaseConnection,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        event_type: Option<EventType>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = Entity::find();
        if let Some(from) = from {
            query = query.filter(Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(Column::Date.lte(to));
        }
        if let Some(event_type) = event_type {
            query = query.filter(Column::EventType.eq(event_type));
        }
        query.order_by_desc(Column::Date).order_by_asc(Column::Id).all(db).await
    }

    /// Whether a school-wide or subject-specific holiday falls on `date`.
    pub async fn is_holiday(db: &DatabaseConnection, subject_id: i64, date: NaiveDate) -> Result<bool, DbErr> {
        let found = Entity::find()
            .filter(Column::Date.eq(date))
            .filter(Column::EventType.eq(EventType::Holiday))
            .filter(
                Condition::any()
                    .add(Column::SubjectId.is_null())
                    .add(Column::SubjectId.eq(subject_id)),
            )
            .one(db)
            .await?;
        Ok(found.is_some())
    }

    pub async fn holidays(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        Self::list(db, None, None, Some(EventType::Holiday)).await
    }

    pub fn is_holiday_event(&self) -> bool {
        self.event_type == EventType::Holiday
    }

    pub async fn update(&self, db: &DatabaseConnection, changes: EventChanges) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        if let Some(title) = changes.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(date) = changes.date {
            active.date = Set(date);
        }
        if let Some(event_type) = changes.event_type {
            active.event_type = Set(event_type);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        active.update(db).await
    }

    pub async fn delete_by_id(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }
}
