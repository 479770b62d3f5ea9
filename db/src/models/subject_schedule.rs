use chrono::{Datelike, NaiveDate, NaiveTime};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryOrder, Set};
use serde::Serialize;

/// A meeting slot for a subject.
///
/// Either weekly (`day_of_week`, 0 = Monday) or tied to a single calendar
/// `date`. Dated slots take precedence over weekly ones on that day.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "subject_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub subject_id: i64,
    pub day_of_week: Option<i32>,
    pub date: Option<NaiveDate>,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
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

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        subject_id: i64,
        day_of_week: Option<i32>,
        date: Option<NaiveDate>,
        time_start: NaiveTime,
        time_end: NaiveTime,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            subject_id: Set(subject_id),
            day_of_week: Set(day_of_week),
            date: Set(date),
            time_start: Set(time_start),
            time_end: Set(time_end),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn for_subject(db: &DatabaseConnection, subject_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .order_by_asc(Column::Date)
            .order_by_asc(Column::DayOfWeek)
            .order_by_asc(Column::TimeStart)
            .all(db)
            .await
    }

    pub async fn delete_for_subject(db: &DatabaseConnection, subject_id: i64, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::SubjectId.eq(subject_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Slots that apply on `date`: the dated ones if any exist, otherwise the
    /// weekly ones for that weekday.
    pub async fn applicable_on(
        db: &DatabaseConnection,
        subject_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Self>, DbErr> {
        let weekday = date.weekday().num_days_from_monday() as i32;
        let slots = Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(
                Condition::any()
                    .add(Column::Date.eq(date))
                    .add(
                        Condition::all()
                            .add(Column::Date.is_null())
                            .add(Column::DayOfWeek.eq(weekday)),
                    ),
            )
            .order_by_asc(Column::TimeStart)
            .all(db)
            .await?;

        let (dated, weekly): (Vec<_>, Vec<_>) = slots.into_iter().partition(|s| s.date.is_some());
        Ok(if dated.is_empty() { weekly } else { dated })
    }
}
