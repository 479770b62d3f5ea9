use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};

/// A student in the registry. The RFID tag is what a badge scan resolves.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub rfid_tag: Option<String>,
    #[sea_orm(unique)]
    pub student_number: Option<String>,
    pub name: String,
    pub email: Option<String>,
    /// Whether the student (or guardian) agreed to receive attendance emails.
    pub email_opt_in: bool,
    /// Linked login account, created on first RFID login.
    #[sea_orm(unique)]
    pub user_id: Option<i64>,
    pub adviser_id: Option<i64>,
    pub profile_picture_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Account,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        super::enrollment::Relation::Subject.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::enrollment::Relation::Student.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Partial update of a student. Blank strings clear optional text fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentChanges {
    pub name: Option<String>,
    pub rfid_tag: Option<String>,
    pub student_number: Option<String>,
    pub email: Option<String>,
    pub email_opt_in: Option<bool>,
    pub adviser_id: Option<i64>,
    pub profile_picture_path: Option<String>,
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Fields for a new registry entry. Blank tags and numbers are stored as NULL
/// so the unique indexes only cover real values.
#[derive(Debug, Clone)]
pub struct NewStudent<'a> {
    pub name: &'a str,
    pub rfid_tag: Option<&'a str>,
    pub student_number: Option<&'a str>,
    pub email: Option<&'a str>,
    pub email_opt_in: bool,
    pub adviser_id: Option<i64>,
}

fn blank_ref_to_none(value: Option<&str>) -> Option<String> {
    value.map(str::to_string).and_then(blank_to_none)
}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        rfid_tag: Option<&str>,
        student_number: Option<&str>,
        email: Option<&str>,
        adviser_id: Option<i64>,
    ) -> Result<Self, DbErr> {
        let new = NewStudent { name, rfid_tag, student_number, email, email_opt_in: true, adviser_id };
        Self::register(db, new).await
    }

    pub async fn register(db: &DatabaseConnection, new: NewStudent<'_>) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = ActiveModel {
            name: Set(new.name.trim().to_string()),
            rfid_tag: Set(blank_ref_to_none(new.rfid_tag)),
            student_number: Set(blank_ref_to_none(new.student_number)),
            email: Set(blank_ref_to_none(new.email)),
            email_opt_in: Set(new.email_opt_in),
            user_id: Set(None),
            adviser_id: Set(new.adviser_id),
            profile_picture_path: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// A blank tag never matches anyone.
    pub async fn find_by_rfid(db: &DatabaseConnection, rfid_tag: &str) -> Result<Option<Self>, DbErr> {
        let rfid_tag = rfid_tag.trim();
        if rfid_tag.is_empty() {
            return Ok(None);
        }
        Entity::find()
            .filter(Column::RfidTag.eq(rfid_tag))
            .one(db)
            .await
    }

    pub async fn find_by_student_number(db: &DatabaseConnection, number: &str) -> Result<Option<Self>, DbErr> {
        let number = number.trim();
        if number.is_empty() {
            return Ok(None);
        }
        Entity::find()
            .filter(Column::StudentNumber.eq(number))
            .one(db)
            .await
    }

    pub async fn find_by_user_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    /// All students, or only those advised by `adviser_id`, ordered by name.
    pub async fn list(db: &DatabaseConnection, adviser_id: Option<i64>) -> Result<Vec<Self>, DbErr> {
        let mut query = Entity::find();
        if let Some(adviser_id) = adviser_id {
            query = query.filter(Column::AdviserId.eq(adviser_id));
        }
        query.order_by_asc(Column::Name).all(db).await
    }

    pub async fn link_user(&self, db: &DatabaseConnection, user_id: i64) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        active.user_id = Set(Some(user_id));
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    pub async fn update(&self, db: &DatabaseConnection, changes: StudentChanges) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        if let Some(name) = changes.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(tag) = changes.rfid_tag {
            active.rfid_tag = Set(blank_to_none(tag));
        }
        if let Some(number) = changes.student_number {
            active.student_number = Set(blank_to_none(number));
        }
        if let Some(email) = changes.email {
            active.email = Set(blank_to_none(email));
        }
        if let Some(opt_in) = changes.email_opt_in {
            active.email_opt_in = Set(opt_in);
        }
        if let Some(adviser_id) = changes.adviser_id {
            active.adviser_id = Set(Some(adviser_id));
        }
        if let Some(path) = changes.profile_picture_path {
            active.profile_picture_path = Set(blank_to_none(path));
        }
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    pub async fn delete_by_id(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    /// The address warning and summary emails go to, if the student accepts them.
    pub fn notification_address(&self) -> Option<&str> {
        if !self.email_opt_in {
            return None;
        }
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}
