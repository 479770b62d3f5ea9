use db::models::user::Role;
use services::derivation_service::Scope;

/// The caller behind a validated session, inserted into request extensions
/// by the guards in [`crate::auth::guards`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
    pub session_id: String,
    pub show_photo: bool,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Adviser)
    }

    /// `None` for admins (no restriction), the adviser's own id otherwise.
    pub fn adviser_filter(&self) -> Option<i64> {
        if self.is_admin() { None } else { Some(self.user_id) }
    }

    /// Student scope for derivation and listings.
    pub fn scope(&self) -> Scope {
        match self.adviser_filter() {
            None => Scope::All,
            Some(id) => Scope::Adviser(id),
        }
    }
}
