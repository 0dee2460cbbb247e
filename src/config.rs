use std::env;
use std::time::Duration;

const DEV_SESSION_SECRET: &str = "wanderplan-development-session-secret-change-me";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
    pub migrations_path: String,
}

/// Session cookie configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_hours: i64,
    pub cookie_secure: bool,
}

/// Where the API server forwards realtime events
#[derive(Debug, Clone, Default)]
pub struct RelayTarget {
    pub url: Option<String>,
    pub secret: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub relay: RelayTarget,
    pub log_level: String,
    pub log_format: String,
    pub http_host: String,
    pub http_port: u16,
    pub environment: String,
}

/// Relay process configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub ws_port: u16,
    pub http_port: u16,
    pub secret: Option<String>,
    pub log_level: String,
    pub log_format: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn validate_log_settings(log_level: &str, log_format: &str) -> Result<(), String> {
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&log_level) {
        return Err(format!(
            "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
            log_level, valid_log_levels
        ));
    }

    let valid_log_formats = ["pretty", "json"];
    if !valid_log_formats.contains(&log_format) {
        return Err(format!(
            "Invalid LOG_FORMAT: {}. Must be one of: {:?}",
            log_format, valid_log_formats
        ));
    }

    Ok(())
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;

        let max_connections = env_parse::<u32>("DATABASE_MAX_CONNECTIONS").unwrap_or(10);
        let acquire_timeout_secs = env_parse::<u64>("DATABASE_ACQUIRE_TIMEOUT_SECS").unwrap_or(30);
        let idle_timeout_secs = env_parse::<u64>("DATABASE_IDLE_TIMEOUT_SECS").unwrap_or(600); // 10 minutes
        let max_lifetime_secs = env_parse::<u64>("DATABASE_MAX_LIFETIME_SECS").unwrap_or(1800); // 30 minutes
        let test_before_acquire = env_parse::<bool>("DATABASE_TEST_BEFORE_ACQUIRE").unwrap_or(true);
        let migrations_path =
            env::var("MIGRATIONS_PATH").unwrap_or_else(|_| "./migrations".to_string());

        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
            migrations_path,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/wanderplan".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
            migrations_path: "./migrations".to_string(),
        }
    }
}

impl SessionConfig {
    /// Read session settings. Production refuses the built-in development secret.
    pub fn from_env(is_production: bool) -> Result<Self, String> {
        let secret = match env_non_empty("SESSION_SECRET") {
            Some(secret) => secret,
            None if is_production => {
                return Err("SESSION_SECRET is required in production".to_string())
            }
            None => DEV_SESSION_SECRET.to_string(),
        };

        if is_production && secret.len() < 32 {
            return Err("SESSION_SECRET must be at least 32 characters in production".to_string());
        }

        let ttl_hours = env_parse::<i64>("SESSION_TTL_HOURS").unwrap_or(720);
        if ttl_hours <= 0 {
            return Err("SESSION_TTL_HOURS must be greater than 0".to_string());
        }

        let cookie_secure = env_parse::<bool>("SESSION_COOKIE_SECURE").unwrap_or(is_production);

        Ok(Self {
            secret,
            ttl_hours,
            cookie_secure,
        })
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SESSION_SECRET.to_string(),
            ttl_hours: 720,
            cookie_secure: false,
        }
    }
}

impl RelayTarget {
    pub fn from_env() -> Self {
        Self {
            url: env_non_empty("RELAY_URL").map(|u| u.trim_end_matches('/').to_string()),
            secret: env_non_empty("RELAY_SECRET"),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase();
        let log_format = env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .to_lowercase();

        let http_host = env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = env_parse::<u16>("HTTP_PORT").unwrap_or(3000);

        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();

        validate_log_settings(&log_level, &log_format)?;

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let session = SessionConfig::from_env(environment == "production")?;

        Ok(Self {
            database,
            session,
            relay: RelayTarget::from_env(),
            log_level,
            log_format,
            http_host,
            http_port,
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Get database URL (convenience method)
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            session: SessionConfig::default(),
            relay: RelayTarget::default(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            environment: "development".to_string(),
        }
    }
}

impl RelayConfig {
    /// Create relay config from environment variables. The relay never touches the database.
    pub fn from_env() -> Result<Self, String> {
        let ws_port = env_parse::<u16>("RELAY_WS_PORT").unwrap_or(3001);
        let http_port = env_parse::<u16>("RELAY_HTTP_PORT").unwrap_or(3002);

        if ws_port == http_port {
            return Err("RELAY_WS_PORT and RELAY_HTTP_PORT must differ".to_string());
        }

        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase();
        let log_format = env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .to_lowercase();
        validate_log_settings(&log_level, &log_format)?;

        Ok(Self {
            ws_port,
            http_port,
            secret: env_non_empty("RELAY_SECRET"),
            log_level,
            log_format,
        })
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ws_port: 3001,
            http_port: 3002,
            secret: None,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// Install the global tracing subscriber shared by both binaries.
pub fn init_tracing(crate_filter: &str, log_level: &str, log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{}={},sqlx=warn,tower_http=info", crate_filter, log_level).into()
    });

    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert_eq!(config.migrations_path, "./migrations");
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(config.is_development());
        assert!(!config.is_production());
        assert!(!config.relay.is_enabled());
    }

    #[test]
    fn test_session_ttl() {
        let session = SessionConfig::default();
        assert_eq!(session.ttl(), chrono::Duration::hours(720));
    }

    #[test]
    fn test_log_settings_validation() {
        assert!(validate_log_settings("debug", "json").is_ok());
        assert!(validate_log_settings("loud", "pretty").is_err());
        assert!(validate_log_settings("info", "xml").is_err());
    }
}
