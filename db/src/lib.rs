pub mod models;
pub mod test_utils;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::path::Path;
use std::time::Duration;
use util::config;

/// Opens the configured database.
///
/// `DATABASE_PATH` may be a full `sqlite:` DSN or a plain file path. File
/// databases are switched to WAL journaling with `synchronous=NORMAL`.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = config::database_path();
    let url = if path_or_url.starts_with("sqlite:") {
        path_or_url
    } else {
        // SQLite won't create intermediate dirs.
        if let Some(parent) = Path::new(&path_or_url).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        format!("sqlite://{path_or_url}?mode=rwc")
    };

    let in_memory = url.contains(":memory:");
    let mut opts = ConnectOptions::new(url);
    opts.connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    if in_memory {
        opts.max_connections(1).min_connections(1);
    }

    let db = Database::connect(opts).await?;

    if !in_memory {
        // journal_mode is persisted in the file itself.
        db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        db.execute_unprepared("PRAGMA synchronous=NORMAL;").await?;
    }

    tracing::info!(in_memory, "database connected");
    Ok(db)
}
