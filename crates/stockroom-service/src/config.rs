//! Service configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use stockroom_db::DbConfig;

/// Credentials for the first super admin, created only on an empty
/// database.
#[derive(Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Name used in log lines
    pub app_name: String,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub database_max_conn: u32,

    /// How long a writer waits for the write lock, in seconds
    pub database_busy_timeout_secs: u64,

    /// Session lifetime in seconds (default: 24 hours)
    pub session_lifetime_secs: i64,

    /// Page size for list operations
    pub page_limit: i64,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,

    /// Optional first super admin
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment, map, ...).
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ServiceConfig {
            app_name: lookup("APP_NAME").unwrap_or_else(|| "stockroom".to_string()),

            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "./stockroom.db".to_string()),

            database_max_conn: parse_or(&lookup, "DATABASE_MAX_CONN", 5)?,

            database_busy_timeout_secs: parse_or(&lookup, "DATABASE_BUSY_TIMEOUT_SECS", 5)?,

            session_lifetime_secs: parse_or(&lookup, "SESSION_LIFETIME_SECS", 86_400)?,

            page_limit: parse_or(&lookup, "PAGE_LIMIT", 20)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            bootstrap_admin: bootstrap_admin(&lookup)?,
        };

        if config.database_max_conn == 0 {
            return Err(ConfigError::InvalidValue("DATABASE_MAX_CONN".to_string()));
        }
        if config.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("SESSION_LIFETIME_SECS".to_string()));
        }
        if config.page_limit <= 0 {
            return Err(ConfigError::InvalidValue("PAGE_LIMIT".to_string()));
        }

        Ok(config)
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_lifetime_secs)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.database_max_conn)
            .busy_timeout(Duration::from_secs(self.database_busy_timeout_secs))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// All three bootstrap variables, or none of them.
fn bootstrap_admin<F>(lookup: &F) -> Result<Option<BootstrapAdmin>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let username = lookup("BOOTSTRAP_ADMIN_USERNAME");
    let email = lookup("BOOTSTRAP_ADMIN_EMAIL");
    let password = lookup("BOOTSTRAP_ADMIN_PASSWORD");

    match (username, email, password) {
        (None, None, None) => Ok(None),
        (Some(username), Some(email), Some(password)) => Ok(Some(BootstrapAdmin {
            username,
            email,
            password,
        })),
        (None, _, _) => Err(ConfigError::MissingRequired("BOOTSTRAP_ADMIN_USERNAME".to_string())),
        (_, None, _) => Err(ConfigError::MissingRequired("BOOTSTRAP_ADMIN_EMAIL".to_string())),
        (_, _, None) => Err(ConfigError::MissingRequired("BOOTSTRAP_ADMIN_PASSWORD".to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_source(source(&[])).unwrap();

        assert_eq!(config.app_name, "stockroom");
        assert_eq!(config.database_path, "./stockroom.db");
        assert_eq!(config.database_max_conn, 5);
        assert_eq!(config.session_lifetime_secs, 86_400);
        assert_eq!(config.page_limit, 20);
        assert_eq!(config.log_level, "info");
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_source(source(&[
            ("DATABASE_PATH", "/var/lib/stockroom.db"),
            ("PAGE_LIMIT", "50"),
            ("SESSION_LIFETIME_SECS", "3600"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, "/var/lib/stockroom.db");
        assert_eq!(config.page_limit, 50);
        assert_eq!(config.session_lifetime(), chrono::Duration::hours(1));
        assert_eq!(config.db_config().max_connections, 5);
    }

    #[test]
    fn test_invalid_numbers() {
        let err = ServiceConfig::from_source(source(&[("PAGE_LIMIT", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "PAGE_LIMIT"));

        let err = ServiceConfig::from_source(source(&[("PAGE_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_bootstrap_admin_needs_all_fields() {
        let err = ServiceConfig::from_source(source(&[("BOOTSTRAP_ADMIN_USERNAME", "root")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));

        let config = ServiceConfig::from_source(source(&[
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "change-me-now"),
        ]))
        .unwrap();
        let admin = config.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "root");
        assert!(!format!("{admin:?}").contains("change-me-now"));
    }
}
