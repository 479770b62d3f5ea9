use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Represents an account in the `users` table.
///
/// Staff (admins and advisers) log in with a username or employee ID and a
/// password. Students log in with their RFID badge; their accounts get an
/// unusable password hash.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Adviser employee ID, accepted in place of the username at login.
    #[sea_orm(unique)]
    pub employee_id: Option<String>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account role. Backed by a `user_role_type` enum in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,

    #[sea_orm(string_value = "adviser")]
    Adviser,

    #[sea_orm(string_value = "student")]
    Student,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Prefix marking a stored hash that can never verify.
const UNUSABLE_PASSWORD_PREFIX: &str = "!";

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
        employee_id: Option<&str>,
        name: &str,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = ActiveModel {
            username: Set(username.trim().to_string()),
            email: Set(email.to_string()),
            password_hash: Set(Self::hash_password(password)?),
            role: Set(role),
            employee_id: Set(employee_id.map(|e| e.trim().to_string())),
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active.insert(db).await
    }

    /// Creates an account that can only be entered through RFID login.
    pub async fn create_without_password(
        db: &DatabaseConnection,
        username: &str,
        email: &str,
        role: Role,
        name: &str,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(format!(
                "{UNUSABLE_PASSWORD_PREFIX}{}",
                rand::random::<u64>()
            )),
            role: Set(role),
            employee_id: Set(None),
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_username(
        db: &DatabaseConnection,
        username: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::Username.eq(username))
            .one(db)
            .await
    }

    /// Looks an account up by username, falling back to the adviser employee ID.
    pub async fn find_by_login_identifier(
        db: &DatabaseConnection,
        identifier: &str,
    ) -> Result<Option<Self>, DbErr> {
        let identifier = identifier.trim();
        let mut matches = Entity::find()
            .filter(
                Condition::any()
                    .add(Column::Username.eq(identifier))
                    .add(Column::EmployeeId.eq(identifier)),
            )
            .all(db)
            .await?;

        // A username match wins over an employee ID that happens to collide.
        matches.sort_by_key(|u| u.username != identifier);
        Ok(matches.into_iter().next())
    }

    /// Returns the account when `identifier` and `password` match, `None` otherwise.
    pub async fn verify_credentials(
        db: &DatabaseConnection,
        identifier: &str,
        password: &str,
    ) -> Result<Option<Self>, DbErr> {
        match Self::find_by_login_identifier(db, identifier).await? {
            Some(user) if user.verify_password(password) => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    pub fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DbErr::Custom(format!("password hashing failed: {e}")))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        if self.password_hash.starts_with(UNUSABLE_PASSWORD_PREFIX) {
            return false;
        }
        let parsed = match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Adviser)
    }
}
