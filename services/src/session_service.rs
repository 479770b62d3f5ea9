//! Server-side sessions and the single-session guard.

use std::sync::atomic::{AtomicBool, Ordering};

use db::models::{
    session,
    session_sweep::{self, SweepReason},
    user,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{error, info, warn};
use util::config::{self, SingleSessionPolicy};

use crate::error::{ServiceError, ServiceResult};

pub const CONFLICT_MESSAGE: &str = "Your account is open on another device. Please log out there first.";

/// Session data key for the scan-screen photo toggle.
pub const SHOW_PHOTO_FLAG: &str = "show_student_photo";

static STARTUP_SWEEP_DONE: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub removed: u64,
    pub audit_id: i64,
}

pub struct SessionService;

impl SessionService {
    /// Opens a session for an already-authenticated user.
    ///
    /// Under [`SingleSessionPolicy::Block`] a user with a live session gets
    /// [`ServiceError::Conflict`] and nothing is written. Under
    /// [`SingleSessionPolicy::Evict`] the old sessions are removed first.
    pub async fn open_session(
        db: &DatabaseConnection,
        user: &user::Model,
        policy: SingleSessionPolicy,
        ttl_minutes: i64,
    ) -> ServiceResult<session::Model> {
        let live = session::Model::active_for_user(db, user.id).await?;
        if !live.is_empty() {
            match policy {
                SingleSessionPolicy::Block => {
                    warn!(user_id = user.id, live = live.len(), "Login refused: session already open");
                    return Err(ServiceError::Conflict(CONFLICT_MESSAGE.into()));
                }
                SingleSessionPolicy::Evict => {
                    let removed = session::Model::delete_for_user(db, user.id).await?;
                    info!(user_id = user.id, removed, "Evicted existing sessions");
                }
            }
        }

        session::Model::delete_expired(db).await?;

        let created = session::Model::create(db, user.id, ttl_minutes).await?;
        info!(user_id = user.id, role = %user.role, "Session opened");
        Ok(created)
    }

    /// Resolves a bearer token to its session and user, extending the expiry.
    pub async fn authenticate(
        db: &DatabaseConnection,
        token: &str,
        ttl_minutes: i64,
    ) -> ServiceResult<(session::Model, user::Model)> {
        let unauthorized = || ServiceError::Unauthorized("Invalid or expired session".into());

        let found = session::Model::find_active(db, token).await?.ok_or_else(unauthorized)?;
        let owner = user::Model::get_by_id(db, found.user_id).await?.ok_or_else(unauthorized)?;
        let touched = found.touch(db, ttl_minutes).await?;
        Ok((touched, owner))
    }

    pub async fn logout(db: &DatabaseConnection, session_id: &str) -> ServiceResult<bool> {
        Ok(session::Model::delete_by_id(db, session_id).await?)
    }

    /// Deletes every session and records the sweep, in one transaction.
    pub async fn sweep_all(
        db: &DatabaseConnection,
        reason: SweepReason,
        triggered_by: Option<i64>,
    ) -> ServiceResult<SweepReport> {
        let txn = db.begin().await?;
        let removed = session::Model::delete_all(&txn).await?;
        let audit = session_sweep::Model::record(&txn, removed, reason, triggered_by).await?;
        txn.commit().await?;

        info!(removed, reason = %reason, triggered_by, audit_id = audit.id, "Sessions swept");
        Ok(SweepReport { removed, audit_id: audit.id })
    }

    /// Startup sweep. Errors are logged and swallowed so the server still starts.
    pub async fn startup_sweep(db: &DatabaseConnection) -> Option<SweepReport> {
        match Self::sweep_all(db, SweepReason::Startup, None).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "Startup session sweep failed; continuing");
                None
            }
        }
    }

    /// Runs [`Self::startup_sweep`] at most once per process, and only when
    /// `enabled` and the `SWEEP_SESSIONS_ON_STARTUP` setting both allow it.
    pub async fn run_startup_sweep_once(db: &DatabaseConnection, enabled: bool) -> Option<SweepReport> {
        if !enabled || !config::sweep_sessions_on_startup() {
            info!("Startup session sweep disabled");
            return None;
        }
        if STARTUP_SWEEP_DONE.swap(true, Ordering::SeqCst) {
            return None;
        }
        Self::startup_sweep(db).await
    }

    pub fn show_photo(session: &session::Model) -> bool {
        session.flag(SHOW_PHOTO_FLAG).unwrap_or(true)
    }

    /// Flips the photo flag on `session_id` and returns the new value.
    pub async fn toggle_photo(db: &DatabaseConnection, session_id: &str) -> ServiceResult<bool> {
        let current = session::Model::find_active(db, session_id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid or expired session".into()))?;
        let next = !Self::show_photo(&current);
        current.set_flag(db, SHOW_PHOTO_FLAG, next).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::user::Role;
    use db::test_utils::setup_test_db;
    use serial_test::serial;
    use util::config::AppConfig;

    async fn adviser(db: &DatabaseConnection) -> user::Model {
        user::Model::create(db, "adviser", "adviser@school.test", "pw", Role::Adviser, Some("EMP-1"), "Adviser")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_block_policy_rejects_second_login() {
        let db = setup_test_db().await;
        let u = adviser(&db).await;

        SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60).await.unwrap();
        let err = SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(ref m) if m == CONFLICT_MESSAGE));
        assert_eq!(session::Model::active_for_user(&db, u.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_evict_policy_replaces_session() {
        let db = setup_test_db().await;
        let u = adviser(&db).await;

        let first = SessionService::open_session(&db, &u, SingleSessionPolicy::Evict, 60).await.unwrap();
        let second = SessionService::open_session(&db, &u, SingleSessionPolicy::Evict, 60).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(SessionService::authenticate(&db, &first.id, 60).await.is_err());
        assert!(SessionService::authenticate(&db, &second.id, 60).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_allows_new_login() {
        let db = setup_test_db().await;
        let u = adviser(&db).await;

        let s = SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60).await.unwrap();
        assert!(SessionService::logout(&db, &s.id).await.unwrap());
        assert!(SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60).await.is_ok());
    }

    #[tokio::test]
    async fn test_sweep_invalidates_tokens_and_writes_audit() {
        let db = setup_test_db().await;
        let u = adviser(&db).await;
        let s = SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60).await.unwrap();

        let report = SessionService::startup_sweep(&db).await.unwrap();
        assert_eq!(report.removed, 1);

        let err = SessionService::authenticate(&db, &s.id, 60).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let audits = session_sweep::Model::recent(&db, 5).await.unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].reason, SweepReason::Startup);
        assert_eq!(audits[0].sessions_removed, 1);
    }

    #[tokio::test]
    async fn test_expired_session_does_not_block() {
        let db = setup_test_db().await;
        let u = adviser(&db).await;

        SessionService::open_session(&db, &u, SingleSessionPolicy::Block, -1).await.unwrap();
        assert!(SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60).await.is_ok());
    }

    #[tokio::test]
    async fn test_photo_flag_defaults_on_and_toggles() {
        let db = setup_test_db().await;
        let u = adviser(&db).await;
        let s = SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60).await.unwrap();

        assert!(SessionService::show_photo(&s));
        assert!(!SessionService::toggle_photo(&db, &s.id).await.unwrap());
        assert!(SessionService::toggle_photo(&db, &s.id).await.unwrap());
    }

    #[tokio::test]
    #[serial]
    async fn test_startup_sweep_runs_once_per_process() {
        AppConfig::reset();
        let db = setup_test_db().await;
        let u = adviser(&db).await;
        let first = SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60).await.unwrap();

        // --no-session-sweep
        assert!(SessionService::run_startup_sweep_once(&db, false).await.is_none());
        AppConfig::set_sweep_sessions_on_startup(false);
        assert!(SessionService::run_startup_sweep_once(&db, true).await.is_none());
        assert!(SessionService::authenticate(&db, &first.id, 60).await.is_ok());

        AppConfig::set_sweep_sessions_on_startup(true);
        let report = SessionService::run_startup_sweep_once(&db, true).await.unwrap();
        assert_eq!(report.removed, 1);
        assert!(SessionService::authenticate(&db, &first.id, 60).await.is_err());

        let second = SessionService::open_session(&db, &u, SingleSessionPolicy::Block, 60).await.unwrap();
        assert!(SessionService::run_startup_sweep_once(&db, true).await.is_none());
        assert!(SessionService::authenticate(&db, &second.id, 60).await.is_ok());
        assert_eq!(session_sweep::Model::recent(&db, 5).await.unwrap().len(), 1);

        AppConfig::reset();
    }
}
