//! Staff password login and student RFID login.

use db::models::{
    session, student,
    user::{self, Role},
};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use util::config::SingleSessionPolicy;

use crate::error::{ServiceError, ServiceResult};
use crate::session_service::SessionService;

pub const BAD_CREDENTIALS: &str = "Invalid username/employee ID or password.";

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: user::Model,
    pub session: session::Model,
    /// Set on student logins.
    pub student: Option<student::Model>,
}

pub struct AuthService;

impl AuthService {
    /// Username-or-employee-ID plus password login.
    pub async fn login(
        db: &DatabaseConnection,
        identifier: &str,
        password: &str,
        policy: SingleSessionPolicy,
        ttl_minutes: i64,
    ) -> ServiceResult<LoginOutcome> {
        let Some(user) = user::Model::verify_credentials(db, identifier, password).await? else {
            warn!(identifier = identifier.trim(), "Failed login attempt");
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.into()));
        };

        let session = SessionService::open_session(db, &user, policy, ttl_minutes).await?;
        info!(user_id = user.id, "User logged in");
        Ok(LoginOutcome { user, session, student: None })
    }

    /// Logs a student in by badge alone, creating and linking an account on
    /// first use.
    pub async fn student_login(
        db: &DatabaseConnection,
        rfid_tag: &str,
        policy: SingleSessionPolicy,
        ttl_minutes: i64,
    ) -> ServiceResult<LoginOutcome> {
        let rfid_tag = rfid_tag.trim();
        if rfid_tag.is_empty() {
            return Err(ServiceError::Validation("RFID tag is required".into()));
        }

        let student = student::Model::find_by_rfid(db, rfid_tag)
            .await?
            .ok_or_else(|| ServiceError::NotFound("RFID card not recognized".into()))?;

        let linked = match student.user_id {
            Some(id) => user::Model::get_by_id(db, id).await?,
            None => None,
        };
        let (user, student) = match linked {
            Some(user) => (user, student),
            None => {
                let user = Self::provision_user(db, &student).await?;
                let student = student.link_user(db, user.id).await?;
                info!(student_id = student.id, user_id = user.id, "Provisioned student account");
                (user, student)
            }
        };

        if user.role != Role::Student {
            return Err(ServiceError::Forbidden("RFID login is only available to students".into()));
        }

        let session = SessionService::open_session(db, &user, policy, ttl_minutes).await?;
        info!(user_id = user.id, student_id = student.id, "Student logged in");
        Ok(LoginOutcome { user, session, student: Some(student) })
    }

    async fn provision_user(db: &DatabaseConnection, student: &student::Model) -> ServiceResult<user::Model> {
        let base = preferred_username(student);

        let mut candidate = base.clone();
        let mut n = 1;
        while user::Model::find_by_username(db, &candidate).await?.is_some() {
            n += 1;
            candidate = format!("{base}_{n}");
        }

        let email = student.email.clone().unwrap_or_default();
        Ok(user::Model::create_without_password(db, &candidate, &email, Role::Student, &student.name).await?)
    }
}

/// Student number, else RFID tag, else the local part of the email.
fn preferred_username(student: &student::Model) -> String {
    let non_blank = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    non_blank(&student.student_number)
        .or_else(|| non_blank(&student.rfid_tag))
        .or_else(|| {
            non_blank(&student.email)
                .and_then(|e| e.split('@').next().map(str::to_string))
                .filter(|p| !p.is_empty())
        })
        .unwrap_or_else(|| format!("student_{}", student.id))
}
