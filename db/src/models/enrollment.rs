use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{JoinType, QuerySelect, Set};
use serde::Serialize;

/// Links a student to a subject. One row per pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub subject_id: i64,
    pub enrolled_at: DateTime<Utc>,
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

impl Model {
    /// Enrolls the student. Returns `false` when the pair was already enrolled.
    pub async fn enroll(db: &DatabaseConnection, student_id: i64, subject_id: i64) -> Result<bool, DbErr> {
        let active = ActiveModel {
            student_id: Set(student_id),
            subject_id: Set(subject_id),
            enrolled_at: Set(Utc::now()),
        };

        let result = Entity::insert(active)
            .on_conflict(
                OnConflict::columns([Column::StudentId, Column::SubjectId])
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

    pub async fn unenroll(db: &DatabaseConnection, student_id: i64, subject_id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id((student_id, subject_id)).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn is_enrolled(db: &DatabaseConnection, student_id: i64, subject_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((student_id, subject_id)).one(db).await?.is_some())
    }

    /// Student ids enrolled in `subject_id`. With `adviser_id`, only that adviser's advisees.
    pub async fn student_ids_for_subject(
        db: &DatabaseConnection,
        subject_id: i64,
        adviser_id: Option<i64>,
    ) -> Result<Vec<i64>, DbErr> {
        let mut query = Entity::find()
            .select_only()
            .column(Column::StudentId)
            .filter(Column::SubjectId.eq(subject_id));

        if let Some(adviser_id) = adviser_id {
            query = query
                .join(JoinType::InnerJoin, Relation::Student.def())
                .filter(super::student::Column::AdviserId.eq(adviser_id));
        }

        query.into_tuple::<i64>().all(db).await
    }

    pub async fn subjects_for_student(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<Vec<super::subject::Model>, DbErr> {
        super::subject::Entity::find()
            .join(JoinType::InnerJoin, super::subject::Relation::Enrollments.def())
            .filter(Column::StudentId.eq(student_id))
            .all(db)
            .await
    }
}
