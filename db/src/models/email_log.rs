use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Every email the system attempts to send, successful or not.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "email_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub subject_id: Option<i64>,
    pub email_to: String,
    pub subject_line: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub email_type: EmailType,
    pub status: EmailStatus,
    pub sent_at: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "email_type")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum EmailType {
    #[sea_orm(string_value = "WARNING")]
    Warning,
    #[sea_orm(string_value = "SEMESTER")]
    Semester,
    #[sea_orm(string_value = "DAILY")]
    Daily,
    #[sea_orm(string_value = "CUSTOM")]
    Custom,
    #[sea_orm(string_value = "CONFIRMATION")]
    Confirmation,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "email_status_type")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum EmailStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SENT")]
    Sent,
    #[sea_orm(string_value = "FAILED")]
    Failed,
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
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create_pending(
        db: &DatabaseConnection,
        student_id: i64,
        subject_id: Option<i64>,
        email_to: &str,
        subject_line: &str,
        body: &str,
        email_type: EmailType,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            student_id: Set(student_id),
            subject_id: Set(subject_id),
            email_to: Set(email_to.to_string()),
            subject_line: Set(subject_line.to_string()),
            body: Set(body.to_string()),
            email_type: Set(email_type),
            status: Set(EmailStatus::Pending),
            sent_at: Set(None),
            error_message: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn mark_sent(&self, db: &DatabaseConnection, at: DateTime<Utc>) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        active.status = Set(EmailStatus::Sent);
        active.sent_at = Set(Some(at));
        active.error_message = Set(None);
        active.update(db).await
    }

    pub async fn mark_failed(&self, db: &DatabaseConnection, error: &str) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        active.status = Set(EmailStatus::Failed);
        active.error_message = Set(Some(error.to_string()));
        active.update(db).await
    }

    /// Most recent successfully sent email of `email_type` for the pair since `since`.
    pub async fn last_sent_since(
        db: &DatabaseConnection,
        student_id: i64,
        subject_id: i64,
        email_type: EmailType,
        since: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::EmailType.eq(email_type))
            .filter(Column::Status.eq(EmailStatus::Sent))
            .filter(Column::SentAt.gte(since))
            .order_by_desc(Column::SentAt)
            .one(db)
            .await
    }

    pub async fn list(
        db: &DatabaseConnection,
        email_type: Option<EmailType>,
        status: Option<EmailStatus>,
        student_ids: Option<&[i64]>,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        use sea_orm::QuerySelect;

        let mut query = Entity::find();
        if let Some(t) = email_type {
            query = query.filter(Column::EmailType.eq(t));
        }
        if let Some(s) = status {
            query = query.filter(Column::Status.eq(s));
        }
        if let Some(ids) = student_ids {
            query = query.filter(Column::StudentId.is_in(ids.iter().copied()));
        }
        query
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(db)
            .await
    }

    pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{student, subject};
    use crate::test_utils::setup_test_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_only_sent_logs_count_for_cooldown() {
        let db = setup_test_db().await;
        let s = student::Model::create(&db, "A", None, None, Some("a@home.test"), None).await.unwrap();
        let subj = subject::Model::create(&db, "SCI", "Science", None, None, None).await.unwrap();
        let since = Utc::now() - Duration::hours(1);

        let failed = Model::create_pending(&db, s.id, Some(subj.id), "a@home.test", "Warn", "body", EmailType::Warning)
            .await
            .unwrap();
        failed.mark_failed(&db, "smtp down").await.unwrap();
        assert!(Model::last_sent_since(&db, s.id, subj.id, EmailType::Warning, since).await.unwrap().is_none());

        let ok = Model::create_pending(&db, s.id, Some(subj.id), "a@home.test", "Warn", "body", EmailType::Warning)
            .await
            .unwrap();
        let ok = ok.mark_sent(&db, Utc::now()).await.unwrap();
        assert_eq!(ok.status, EmailStatus::Sent);

        let found = Model::last_sent_since(&db, s.id, subj.id, EmailType::Warning, since).await.unwrap();
        assert_eq!(found.map(|l| l.id), Some(ok.id));

        let later = Utc::now() + Duration::hours(1);
        assert!(Model::last_sent_since(&db, s.id, subj.id, EmailType::Warning, later).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = setup_test_db().await;
        let s = student::Model::create(&db, "A", None, None, Some("a@home.test"), None).await.unwrap();
        Model::create_pending(&db, s.id, None, "a@home.test", "Summary", "b", EmailType::Semester).await.unwrap();
        let w = Model::create_pending(&db, s.id, None, "a@home.test", "Warn", "b", EmailType::Warning).await.unwrap();
        w.mark_failed(&db, "x").await.unwrap();

        let failed = Model::list(&db, None, Some(EmailStatus::Failed), None, 50).await.unwrap();
        assert_eq!(failed.len(), 1);
        let semester = Model::list(&db, Some(EmailType::Semester), None, Some(&[s.id]), 50).await.unwrap();
        assert_eq!(semester.len(), 1);
        let nobody = Model::list(&db, None, None, Some(&[]), 50).await.unwrap();
        assert!(nobody.is_empty());
    }
}
