use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

use crate::repositories::inventory_repository::NegativeStockPolicy;
use crate::services::stock_transfer::VoidPolicy;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_DATABASE_URL: &str = "sqlite://stockflow.db?mode=rwc";
const CONFIG_DIR: &str = "config";

/// Movement engine tuning
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfig {
    /// What `apply_delta` does when a balance would drop below zero
    #[serde(default)]
    pub negative_stock: NegativeStockPolicy,

    /// How voiding a transfer treats inventory it already moved
    #[serde(default)]
    pub void_policy: VoidPolicy,

    /// Row-lock wait bound in seconds (Postgres only), 0 = wait forever
    #[serde(default = "default_lock_timeout_secs")]
    #[validate(range(max = 300))]
    pub lock_timeout_secs: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            negative_stock: NegativeStockPolicy::default(),
            void_policy: VoidPolicy::default(),
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

impl InventoryConfig {
    pub fn lock_timeout(&self) -> Option<Duration> {
        match self.lock_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Echo every SQL statement through sqlx's logger
    #[serde(default)]
    pub db_sqlx_logging: bool,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    #[serde(default)]
    #[validate]
    pub inventory: InventoryConfig,
}

impl AppConfig {
    /// Configuration with every default applied, pointed at `database_url`.
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_sqlx_logging: false,
            event_channel_capacity: default_event_channel_capacity(),
            inventory: InventoryConfig::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks that span more than one field.
    pub fn validate_additional_constraints(&self) -> Result<(), validator::ValidationErrors> {
        let mut errors = validator::ValidationErrors::new();

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections cannot exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if self.is_production() && self.database_url.starts_with("sqlite:") {
            let mut err = ValidationError::new("database_url");
            err.message = Some(
                "SQLite cannot hold row locks across transactions; use Postgres in production"
                    .into(),
            );
            errors.add("database_url", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl From<AppConfigError> for crate::errors::ServiceError {
    fn from(err: AppConfigError) -> Self {
        crate::errors::ServiceError::ConfigError(err.to_string())
    }
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_lock_timeout_secs() -> u64 {
    5
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("stockflow={},sea_orm=warn", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(content: &str) -> AppConfig {
        Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)
            .unwrap()
            .set_default("environment", DEFAULT_ENV)
            .unwrap()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_allow_negative_stock_and_compensate_voids() {
        let cfg = from_toml("");
        assert_eq!(cfg.inventory.negative_stock, NegativeStockPolicy::Allow);
        assert_eq!(cfg.inventory.void_policy, VoidPolicy::Compensate);
        assert_eq!(cfg.inventory.lock_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(cfg.event_channel_capacity, 1024);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn inventory_policies_are_read_from_their_section() {
        let cfg = from_toml(
            r#"
            [inventory]
            negative_stock = "reject"
            void_policy = "reject_applied"
            lock_timeout_secs = 0
            "#,
        );
        assert_eq!(cfg.inventory.negative_stock, NegativeStockPolicy::Reject);
        assert_eq!(cfg.inventory.void_policy, VoidPolicy::RejectApplied);
        assert_eq!(cfg.inventory.lock_timeout(), None);
    }

    #[test]
    fn settings_file_on_disk_is_layered_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(
            &path,
            "log_level = \"debug\"\nevent_channel_capacity = 16\n[inventory]\nnegative_stock = \"reject\"\n",
        )
        .unwrap();

        let cfg: AppConfig = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)
            .unwrap()
            .set_default("environment", "test")
            .unwrap()
            .add_source(File::from(path.as_path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.event_channel_capacity, 16);
        assert_eq!(cfg.inventory.negative_stock, NegativeStockPolicy::Reject);
        assert_eq!(cfg.inventory.void_policy, VoidPolicy::Compensate);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        cfg.log_level = "loud".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        cfg.event_channel_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn production_rejects_sqlite_and_inverted_pool_bounds() {
        let cfg = AppConfig::new("sqlite://stockflow.db".into(), "production".into());
        assert!(cfg.validate_additional_constraints().is_err());

        let mut cfg = AppConfig::new("postgres://localhost/stockflow".into(), "production".into());
        assert!(cfg.validate_additional_constraints().is_ok());
        cfg.db_min_connections = 20;
        assert!(cfg.validate_additional_constraints().is_err());
    }
}
