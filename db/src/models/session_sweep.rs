use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Audit row written every time all sessions are invalidated at once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "session_sweeps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub swept_at: DateTime<Utc>,
    pub sessions_removed: i64,
    pub reason: SweepReason,
    pub triggered_by: Option<i64>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "snake_case")]
pub enum SweepReason {
    #[sea_orm(string_value = "startup")]
    Startup,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn record<C: ConnectionTrait>(
        db: &C,
        sessions_removed: u64,
        reason: SweepReason,
        triggered_by: Option<i64>,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            swept_at: Set(Utc::now()),
            sessions_removed: Set(sessions_removed as i64),
            reason: Set(reason),
            triggered_by: Set(triggered_by),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn recent(db: &DatabaseConnection, limit: u64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .order_by_desc(Column::SweptAt)
            .limit(limit)
            .all(db)
            .await
    }
}
