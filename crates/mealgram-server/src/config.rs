use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Telegram platform settings (bot token).
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let env = self.server.environment.to_ascii_lowercase();
        if !["production", "development"].contains(&env.as_str()) {
            return Err("server.environment must be 'production' or 'development'".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.telegram.bot_token.is_empty() {
            return Err("telegram.bot_token is required (or set TELEGRAM_BOT_TOKEN)".into());
        }
        let pg = &self.storage.postgres;
        if pg.url.is_none() && pg.host.is_empty() {
            return Err("storage.postgres requires either 'url' or 'host' to be set".into());
        }
        if pg.url.is_none() && pg.database.is_empty() {
            return Err("storage.postgres.database must not be empty".into());
        }
        if self.cache.food_ttl_hours <= 0 {
            return Err("cache.food_ttl_hours must be > 0".into());
        }
        if self.cache.cleanup_interval_secs == 0 {
            return Err("cache.cleanup_interval_secs must be > 0".into());
        }
        if self.telegram.replay_sweep_interval_secs == 0 {
            return Err("telegram.replay_sweep_interval_secs must be > 0".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Returns `true` when internal error detail may appear in
    /// responses.
    pub fn expose_error_detail(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("development")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// "production" or "development"; development attaches internal
    /// error detail to auth rejections.
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_environment() -> String {
    "production".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub postgres: PostgresConfig,
}

/// PostgreSQL configuration.
///
/// Supports two modes:
/// 1. URL mode: set `url` (or the `DATABASE_URL` environment variable)
///    to a full connection string
/// 2. Separate options mode: set `host`, `port`, `user`, `password`,
///    `database` individually
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_pg_host")]
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    #[serde(default = "default_pg_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_pg_database")]
    pub database: String,
}

fn default_pg_host() -> String {
    "localhost".into()
}
fn default_pg_port() -> u16 {
    5432
}
fn default_pg_user() -> String {
    "postgres".into()
}
fn default_pg_database() -> String {
    "mealgram".into()
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_pg_host(),
            port: default_pg_port(),
            user: default_pg_user(),
            password: String::new(),
            database: default_pg_database(),
        }
    }
}

impl PostgresConfig {
    /// The connection string: `url` if set, composed otherwise.
    pub fn connection_url(&self) -> String {
        if let Some(ref url) = self.url {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token shared with Telegram. Prefer the `TELEGRAM_BOT_TOKEN`
    /// environment variable over putting it in the config file.
    #[serde(default)]
    pub bot_token: String,
    /// Period of the replay-record sweep, in seconds.
    #[serde(default = "default_replay_sweep_interval_secs")]
    pub replay_sweep_interval_secs: u64,
}

fn default_replay_sweep_interval_secs() -> u64 {
    5 * 60
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            replay_sweep_interval_secs: default_replay_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Durable TTL for nutrition analysis results, in hours.
    #[serde(default = "default_food_ttl_hours")]
    pub food_ttl_hours: i64,
    /// Period of the durable-tier expiry sweep, in seconds.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_food_ttl_hours() -> i64 {
    24
}
fn default_cleanup_interval_secs() -> u64 {
    60 * 60
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            food_ttl_hours: default_food_ttl_hours(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load configuration from a TOML file, then apply environment
/// overrides for secret material.
///
/// A missing file is not an error; defaults plus environment variables
/// are enough for a container deployment.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed,
/// or if the resulting configuration fails validation.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
    let mut cfg = match path {
        Some(p) if std::path::Path::new(p).exists() => {
            let raw = std::fs::read_to_string(p).map_err(|e| format!("read {p}: {e}"))?;
            toml::from_str(&raw).map_err(|e| format!("parse {p}: {e}"))?
        }
        _ => AppConfig::default(),
    };

    if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
        if !token.is_empty() {
            cfg.telegram.bot_token = token;
        }
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.is_empty() {
            cfg.storage.postgres.url = Some(url);
        }
    }

    cfg.validate()?;
    Ok(cfg)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.telegram.bot_token = "123456:TEST-TOKEN".into();
        cfg
    }

    #[test]
    fn test_defaults_validate_with_token() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut cfg = valid_config();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_environment_rejected() {
        let mut cfg = valid_config();
        cfg.server.environment = "staging".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_nonpositive_food_ttl_rejected() {
        let mut cfg = valid_config();
        cfg.cache.food_ttl_hours = 0;
        assert!(cfg.validate().is_err());
        cfg.cache.food_ttl_hours = -1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_sweep_intervals_rejected() {
        let mut cfg = valid_config();
        cfg.cache.cleanup_interval_secs = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.telegram.replay_sweep_interval_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_replay_sweep_interval_default() {
        assert_eq!(TelegramConfig::default().replay_sweep_interval_secs, 300);
    }

    #[test]
    fn test_expose_error_detail_only_in_development() {
        let mut cfg = valid_config();
        assert!(!cfg.expose_error_detail());
        cfg.server.environment = "development".into();
        assert!(cfg.expose_error_detail());
    }

    #[test]
    fn test_connection_url_composed_from_parts() {
        let pg = PostgresConfig::default();
        assert_eq!(
            pg.connection_url(),
            "postgres://postgres:@localhost:5432/mealgram"
        );
    }

    #[test]
    fn test_connection_url_prefers_explicit_url() {
        let pg = PostgresConfig {
            url: Some("postgres://u:p@db/x".into()),
            ..PostgresConfig::default()
        };
        assert_eq!(pg.connection_url(), "postgres://u:p@db/x");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [server]
            port = 8081
            environment = "development"

            [telegram]
            bot_token = "123456:FILE-TOKEN"

            [cache]
            food_ttl_hours = 6
            "#
        )
        .unwrap();

        let cfg = load_config(file.path().to_str()).unwrap();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.cache.food_ttl_hours, 6);
        assert!(cfg.expose_error_detail());
    }

    #[test]
    fn test_addr_from_config() {
        let mut cfg = valid_config();
        cfg.server.host = "127.0.0.1".into();
        cfg.server.port = 9000;
        assert_eq!(cfg.addr().to_string(), "127.0.0.1:9000");
    }
}
