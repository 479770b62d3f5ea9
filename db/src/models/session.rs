use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::Serialize;
use serde_json::{Map, Value};

/// Length of the opaque session identifier handed to clients.
pub const SESSION_ID_LEN: usize = 48;

/// A server-side login session.
///
/// The id doubles as the bearer token. `data` holds per-session flags as a JSON
/// object (for example `show_student_photo`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[serde(skip_serializing)]
    pub id: String,
    pub user_id: i64,
    #[sea_orm(column_type = "Text")]
    pub data: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

impl Model {
    pub async fn create(db: &DatabaseConnection, user_id: i64, ttl_minutes: i64) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = ActiveModel {
            id: Set(generate_id()),
            user_id: Set(user_id),
            data: Set("{}".to_string()),
            expires_at: Set(now + Duration::minutes(ttl_minutes)),
            created_at: Set(now),
        };
        active.insert(db).await
    }

    /// The session for `id` if it exists and has not expired.
    pub async fn find_active(db: &DatabaseConnection, id: &str) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id.to_string())
            .filter(Column::ExpiresAt.gt(Utc::now()))
            .one(db)
            .await
    }

    /// Live sessions owned by `user_id`, newest first. Served by the
    /// `(user_id, expires_at)` index.
    pub async fn active_for_user(db: &DatabaseConnection, user_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    pub async fn delete_by_id(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id.to_string()).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn delete_for_user(db: &DatabaseConnection, user_id: i64) -> Result<u64, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_all<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        let res = Entity::delete_many().exec(db).await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_expired(db: &DatabaseConnection) -> Result<u64, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::ExpiresAt.lte(Utc::now()))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    /// Pushes the expiry out to `ttl_minutes` from now.
    pub async fn touch(&self, db: &DatabaseConnection, ttl_minutes: i64) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        active.expires_at = Set(Utc::now() + Duration::minutes(ttl_minutes));
        active.update(db).await
    }

    fn data_map(&self) -> Map<String, Value> {
        match serde_json::from_str::<Value>(&self.data) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.data_map().get(key).and_then(Value::as_bool)
    }

    pub async fn set_flag(&self, db: &DatabaseConnection, key: &str, value: bool) -> Result<Self, DbErr> {
        let mut map = self.data_map();
        map.insert(key.to_string(), Value::Bool(value));

        let mut active: ActiveModel = self.clone().into();
        active.data = Set(Value::Object(map).to_string());
        active.update(db).await
    }
}
