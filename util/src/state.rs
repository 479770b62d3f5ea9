//! Application state container shared across Axum route handlers and services.
//!
//! Holds the database connection and the outgoing mailer. It is cheap to clone
//! and passed into route handlers via Axum's `State<T>` extractor.

use crate::email::Mailer;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection and mailer.
    pub fn new(db: DatabaseConnection, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, mailer }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    pub fn mailer_clone(&self) -> Arc<dyn Mailer> {
        self.mailer.clone()
    }
}
