use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Secret used when JWT_SECRET is not provided. Refused in production.
pub const DEV_JWT_SECRET: &str = "your-secret-key-change-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub tos: TosConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
    pub seed_demo_account: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    #[serde(with = "duration_secs")]
    pub access_token_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub refresh_token_ttl: Duration,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

/// One fixed-window quota: at most `max` requests per `window`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quota {
    pub max: u32,
    #[serde(with = "duration_secs")]
    pub window: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub login: Quota,
    pub register: Quota,
    pub api: Quota,
    pub delete_account: Quota,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TosConfig {
    pub current_version: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-default value in production")]
    InsecureJwtSecret,
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("MINI_NOTES_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }
        if let Ok(v) = env::var("SEED_DEMO_ACCOUNT") {
            self.database.seed_demo_account = v.parse().unwrap_or(self.database.seed_demo_account);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.trim().is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("JWT_EXPIRES_IN") {
            self.security.access_token_ttl = parse_duration(&v).unwrap_or(self.security.access_token_ttl);
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN") {
            self.security.refresh_token_ttl = parse_duration(&v).unwrap_or(self.security.refresh_token_ttl);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Rate limit overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.rate_limit.enabled = v.parse().unwrap_or(self.rate_limit.enabled);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.rate_limit.api.max = v.parse().unwrap_or(self.rate_limit.api.max);
        }
        if let Ok(v) = env::var("AUTH_RATE_LIMIT_REQUESTS") {
            self.rate_limit.login.max = v.parse().unwrap_or(self.rate_limit.login.max);
        }
        if let Ok(v) = env::var("REGISTER_RATE_LIMIT_REQUESTS") {
            self.rate_limit.register.max = v.parse().unwrap_or(self.rate_limit.register.max);
        }

        if let Ok(v) = env::var("TOS_CURRENT_VERSION") {
            self.tos.current_version = v;
        }

        self
    }

    /// Checks that must hold before the server is allowed to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.environment == Environment::Production && self.security.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::InsecureJwtSecret);
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
                seed_demo_account: false,
            },
            security: Self::default_security(vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ]),
            rate_limit: Self::default_rate_limits(),
            tos: TosConfig {
                current_version: "1.0.0".to_string(),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.server.max_request_size_bytes = 256 * 1024;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.run_migrations = false;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config
    }

    fn default_security(cors_origins: Vec<String>) -> SecurityConfig {
        SecurityConfig {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            jwt_issuer: "mini-notes-api".to_string(),
            jwt_audience: "mini-notes-client".to_string(),
            bcrypt_cost: 12,
            cors_origins,
        }
    }

    fn default_rate_limits() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            login: Quota { max: 10, window: Duration::from_secs(15 * 60) },
            register: Quota { max: 10, window: Duration::from_secs(3600) },
            api: Quota { max: 100, window: Duration::from_secs(60) },
            delete_account: Quota { max: 1, window: Duration::from_secs(3600) },
        }
    }
}

/// Parses `<n>s`, `<n>m`, `<n>h`, `<n>d` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (number, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], c),
        _ => (value, 's'),
    };
    let n: u64 = number.trim().parse().ok()?;
    let secs = match unit {
        's' => n,
        'm' => n.checked_mul(60)?,
        'h' => n.checked_mul(3600)?,
        'd' => n.checked_mul(86_400)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.security.refresh_token_ttl, Duration::from_secs(604_800));
        assert_eq!(config.rate_limit.delete_account.max, 1);
        assert_eq!(config.tos.current_version, "1.0.0");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.run_migrations);
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn parses_duration_suffixes() {
        assert_eq!(parse_duration("15m"), Some(Duration::from_secs(900)));
        assert_eq!(parse_duration("7d"), Some(Duration::from_secs(604_800)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("45"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("10x"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn production_rejects_default_secret() {
        let mut config = AppConfig::production();
        config.database.url = "postgres://localhost/mini_notes".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InsecureJwtSecret)));

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::MissingDatabaseUrl)));
    }
}
