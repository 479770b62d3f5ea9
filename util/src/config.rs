//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Attendance policy (grace period, warning threshold, time windows) is not kept
//! here; it lives in the `system_settings` table so operators can change it while
//! the server is running.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// What happens when an account that already has a live session logs in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleSessionPolicy {
    /// Refuse the new login and leave the existing session untouched.
    Block,
    /// Delete the existing sessions and let the new login through.
    Evict,
}

impl FromStr for SingleSessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "evict" => Ok(Self::Evict),
            other => Err(format!("unknown single session policy '{other}'")),
        }
    }
}

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub allowed_hosts: Vec<String>,
    pub session_ttl_minutes: i64,
    pub single_session_policy: SingleSessionPolicy,
    pub sweep_sessions_on_startup: bool,
    pub utc_offset_minutes: i32,
    pub mail_server: String,
    pub mail_port: u16,
    pub mail_username: String,
    pub mail_password: String,
    pub mail_use_tls: bool,
    pub mail_default_sender: String,
    pub mail_timeout_secs: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

/// Splits a comma separated host list, dropping blanks.
fn split_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if variables are present but improperly formatted.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut allowed_hosts = split_hosts(
            &env::var("ALLOWED_HOSTS").unwrap_or_else(|_| "localhost,127.0.0.1,::1".into()),
        );
        allowed_hosts.extend(split_hosts(
            &env::var("ADDITIONAL_HOSTS").unwrap_or_default(),
        ));

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME")
                .unwrap_or_else(|_| "attendance-monitor".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info,services=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/attendance.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".into())
                .parse()
                .expect("PORT must be a valid port number"),
            allowed_hosts,
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .unwrap_or_else(|_| "1440".into())
                .parse()
                .expect("SESSION_TTL_MINUTES must be an integer"),
            single_session_policy: env::var("SINGLE_SESSION_POLICY")
                .unwrap_or_else(|_| "block".into())
                .parse()
                .expect("SINGLE_SESSION_POLICY must be 'block' or 'evict'"),
            sweep_sessions_on_startup: env::var("SWEEP_SESSIONS_ON_STARTUP")
                .unwrap_or_else(|_| "true".into())
                == "true",
            utc_offset_minutes: env::var("UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "480".into())
                .parse()
                .expect("UTC_OFFSET_MINUTES must be an integer"),
            mail_server: env::var("MAIL_SERVER").unwrap_or_else(|_| "smtp.gmail.com".into()),
            mail_port: env::var("MAIL_PORT")
                .unwrap_or_else(|_| "587".into())
                .parse()
                .expect("MAIL_PORT must be a valid port number"),
            mail_username: env::var("MAIL_USERNAME").unwrap_or_default(),
            mail_password: env::var("MAIL_PASSWORD").unwrap_or_default(),
            mail_use_tls: env::var("MAIL_USE_TLS").unwrap_or_else(|_| "true".into()) == "true",
            mail_default_sender: env::var("MAIL_DEFAULT_SENDER").unwrap_or_default(),
            mail_timeout_secs: env::var("MAIL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .expect("MAIL_TIMEOUT_SECS must be an integer"),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_project_name(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_name = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_host(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.host = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    /// Replaces the full host allow-list (defaults and `ADDITIONAL_HOSTS` included).
    pub fn set_allowed_hosts(value: Vec<String>) {
        AppConfig::set_field(|cfg| {
            cfg.allowed_hosts = value.into_iter().map(|h| h.to_ascii_lowercase()).collect()
        });
    }

    pub fn set_session_ttl_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.session_ttl_minutes = value);
    }

    pub fn set_single_session_policy(value: SingleSessionPolicy) {
        AppConfig::set_field(|cfg| cfg.single_session_policy = value);
    }

    pub fn set_sweep_sessions_on_startup(value: bool) {
        AppConfig::set_field(|cfg| cfg.sweep_sessions_on_startup = value);
    }

    pub fn set_utc_offset_minutes(value: i32) {
        AppConfig::set_field(|cfg| cfg.utc_offset_minutes = value);
    }

    pub fn set_mail_default_sender(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.mail_default_sender = value.into());
    }
}

// --- Free accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn allowed_hosts() -> Vec<String> {
    AppConfig::global().allowed_hosts.clone()
}

pub fn session_ttl_minutes() -> i64 {
    AppConfig::global().session_ttl_minutes
}

pub fn single_session_policy() -> SingleSessionPolicy {
    AppConfig::global().single_session_policy
}

pub fn sweep_sessions_on_startup() -> bool {
    AppConfig::global().sweep_sessions_on_startup
}

pub fn utc_offset_minutes() -> i32 {
    AppConfig::global().utc_offset_minutes
}

pub fn mail_server() -> String {
    AppConfig::global().mail_server.clone()
}

pub fn mail_port() -> u16 {
    AppConfig::global().mail_port
}

pub fn mail_username() -> String {
    AppConfig::global().mail_username.clone()
}

pub fn mail_password() -> String {
    AppConfig::global().mail_password.clone()
}

pub fn mail_use_tls() -> bool {
    AppConfig::global().mail_use_tls
}

/// Sender address for outgoing mail, falling back to the SMTP username.
pub fn mail_default_sender() -> String {
    let cfg = AppConfig::global();
    if cfg.mail_default_sender.is_empty() {
        cfg.mail_username.clone()
    } else {
        cfg.mail_default_sender.clone()
    }
}

pub fn mail_timeout_secs() -> u64 {
    AppConfig::global().mail_timeout_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Block".parse::<SingleSessionPolicy>(), Ok(SingleSessionPolicy::Block));
        assert_eq!(" evict ".parse::<SingleSessionPolicy>(), Ok(SingleSessionPolicy::Evict));
        assert!("kick".parse::<SingleSessionPolicy>().is_err());
    }

    #[test]
    fn host_lists_are_trimmed_and_lowercased() {
        assert_eq!(
            split_hosts(" Attendance.local, ,10.0.0.5 "),
            vec!["attendance.local".to_string(), "10.0.0.5".to_string()]
        );
    }

    #[test]
    #[serial]
    fn setters_override_and_reset_restores() {
        AppConfig::set_session_ttl_minutes(5);
        AppConfig::set_single_session_policy(SingleSessionPolicy::Evict);
        assert_eq!(session_ttl_minutes(), 5);
        assert_eq!(single_session_policy(), SingleSessionPolicy::Evict);

        AppConfig::reset();
        assert_eq!(session_ttl_minutes(), AppConfig::from_env().session_ttl_minutes);
    }

    #[test]
    #[serial]
    fn sender_falls_back_to_username() {
        AppConfig::set_field(|cfg| {
            cfg.mail_username = "robot@school.test".into();
            cfg.mail_default_sender = String::new();
        });
        assert_eq!(mail_default_sender(), "robot@school.test");

        AppConfig::set_mail_default_sender("Attendance <noreply@school.test>");
        assert_eq!(mail_default_sender(), "Attendance <noreply@school.test>");
        AppConfig::reset();
    }
}
