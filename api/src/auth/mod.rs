pub mod extractors;
pub mod guards;
pub mod middleware;
pub mod user;

pub use user::AuthUser;
