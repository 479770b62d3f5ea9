pub mod attendance_service;
pub mod auth_service;
pub mod calendar_service;
pub mod clock;
pub mod derivation_service;
pub mod email_service;
pub mod error;
pub mod schedule;
pub mod session_service;
pub mod warning_service;

#[cfg(test)]
pub(crate) mod test_support;
