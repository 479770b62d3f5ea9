use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One attendance outcome for a (student, subject, date) triple.
///
/// The table carries a unique index on `(student_id, subject_id, date)`; every
/// insert path goes through [`Model::insert_if_absent`] so concurrent writers
/// collapse onto a single row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub date: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status_type")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "PRESENT")]
    Present,

    #[sea_orm(string_value = "LATE")]
    Late,

    #[sea_orm(string_value = "ABSENT")]
    Absent,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id",
        on_delete = "Cascade"
    )]
    Subject,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Field values for a record that may not exist yet.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub student_id: i64,
    pub subject_id: i64,
    pub date: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: String,
}

impl NewRecord {
    pub fn absent(student_id: i64, subject_id: i64, date: NaiveDate) -> Self {
        Self {
            student_id,
            subject_id,
            date,
            time_in: None,
            time_out: None,
            status: AttendanceStatus::Absent,
            notes: String::new(),
        }
    }
}

impl Model {
    /// Inserts `new` unless a row for the same triple already exists.
    ///
    /// Returns `true` only when this call created the row. An existing row is
    /// left exactly as it was.
    pub async fn insert_if_absent<C>(db: &C, new: NewRecord) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        let active = ActiveModel {
            student_id: Set(new.student_id),
            subject_id: Set(new.subject_id),
            date: Set(new.date),
            time_in: Set(new.time_in),
            time_out: Set(new.time_out),
            status: Set(new.status),
            notes: Set(new.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = Entity::insert(active)
            .on_conflict(
                OnConflict::columns([Column::StudentId, Column::SubjectId, Column::Date])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn find_for<C>(
        db: &C,
        student_id: i64,
        subject_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Date.eq(date))
            .one(db)
            .await
    }

    /// Ids of students that have any record for the subject on `date`.
    pub async fn recorded_student_ids(
        db: &DatabaseConnection,
        subject_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<i64>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::StudentId)
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Date.eq(date))
            .into_tuple::<i64>()
            .all(db)
            .await
    }

    pub async fn for_subject_on(
        db: &DatabaseConnection,
        subject_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Date.eq(date))
            .order_by_asc(Column::StudentId)
            .all(db)
            .await
    }

    pub async fn on_date(db: &DatabaseConnection, date: NaiveDate) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::Date.eq(date))
            .order_by_asc(Column::SubjectId)
            .order_by_asc(Column::StudentId)
            .all(db)
            .await
    }

    /// Removes derived absences (ABSENT with no time-in or time-out) on
    /// `date`, for one subject or for all when `subject_id` is `None`.
    /// Scanned and manually timed rows are kept.
    pub async fn delete_derived_absences(
        db: &DatabaseConnection,
        date: NaiveDate,
        subject_id: Option<i64>,
    ) -> Result<u64, DbErr> {
        let mut query = Entity::delete_many()
            .filter(Column::Date.eq(date))
            .filter(Column::Status.eq(AttendanceStatus::Absent))
            .filter(Column::TimeIn.is_null())
            .filter(Column::TimeOut.is_null());
        if let Some(subject_id) = subject_id {
            query = query.filter(Column::SubjectId.eq(subject_id));
        }
        Ok(query.exec(db).await?.rows_affected)
    }

    pub async fn for_student(
        db: &DatabaseConnection,
        student_id: i64,
        subject_id: Option<i64>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = Entity::find().filter(Column::StudentId.eq(student_id));
        if let Some(subject_id) = subject_id {
            query = query.filter(Column::SubjectId.eq(subject_id));
        }
        query.order_by_desc(Column::Date).all(db).await
    }

    pub async fn count_with_status(
        db: &DatabaseConnection,
        student_id: i64,
        subject_id: i64,
        status: AttendanceStatus,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Status.eq(status))
            .count(db)
            .await
    }

    pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn delete_by_id(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }
}
