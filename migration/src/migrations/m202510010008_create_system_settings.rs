use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010008_create_system_settings"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let int_col = |name: &str, default: i32| {
            ColumnDef::new(Alias::new(name))
                .integer()
                .not_null()
                .default(default)
                .to_owned()
        };
        let bool_col = |name: &str, default: bool| {
            ColumnDef::new(Alias::new(name))
                .boolean()
                .not_null()
                .default(default)
                .to_owned()
        };

        manager
            .create_table(
                Table::create()
                    .table(Alias::new("system_settings"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(int_col("grace_period_minutes", 15))
                    .col(int_col("warning_threshold", 3))
                    .col(int_col("warning_cooldown_hours", 168))
                    .col(bool_col("email_notifications_enabled", true))
                    .col(bool_col("enable_time_validation", true))
                    .col(int_col("early_attendance_minutes", 30))
                    .col(int_col("late_attendance_minutes", 60))
                    .col(int_col("timeout_before_minutes", 15))
                    .col(
                        ColumnDef::new(Alias::new("class_start_time"))
                            .time()
                            .not_null()
                            .default("08:00:00"),
                    )
                    .col(
                        ColumnDef::new(Alias::new("class_end_time"))
                            .time()
                            .not_null()
                            .default("17:00:00"),
                    )
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().null())
                    .to_owned(),
            )
            .await?;

        // Singleton row; every column falls back to its default.
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Alias::new("system_settings"))
                    .columns([Alias::new("id")])
                    .values_panic([1.into()])
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("system_settings")).to_owned())
            .await
    }
}
