//! Shop API configuration module.
//!
//! Configuration is layered, later sources winning:
//!
//! ```text
//! ShopConfig::default()          built-in defaults
//!        │
//!        ▼
//! shop.toml (or $SHOP_CONFIG)    optional file
//!        │
//!        ▼
//! SHOP_* environment             e.g. SHOP_HTTP_PORT=9000
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV_VAR: &str = "SHOP_CONFIG";

/// Config file read when `SHOP_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "shop.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SHOP";

/// Shop API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    pub database_max_connections: u32,

    /// HS256 secret for bearer tokens. Required.
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Stripe secret key. Required.
    pub stripe_secret_key: String,

    pub stripe_api_base: String,

    /// Upper bound on one Stripe request, connect to last byte
    pub stripe_timeout_secs: u64,

    /// ISO currency sent with every payment intent
    pub currency: String,

    /// Fallback when RUST_LOG is unset
    pub log_level: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            http_port: 8000,
            database_path: "./nexcart.db".to_string(),
            database_max_connections: 5,
            jwt_secret: String::new(),
            jwt_lifetime_secs: 3600,
            stripe_secret_key: String::new(),
            stripe_api_base: "https://api.stripe.com".to_string(),
            stripe_timeout_secs: 10,
            currency: "usd".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ShopConfig {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        use ::config::{Config, Environment, File, FileFormat};

        let path = std::env::var(CONFIG_PATH_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let config: ShopConfig = Config::builder()
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.stripe_secret_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired("stripe_secret_key".to_string()));
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue("database_max_connections".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.stripe_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("stripe_timeout_secs".to_string()));
        }
        if self.currency.len() != 3 {
            return Err(ConfigError::InvalidValue("currency".to_string()));
        }
        Ok(())
    }

    pub fn jwt_lifetime(&self) -> Duration {
        Duration::from_secs(self.jwt_lifetime_secs.unsigned_abs())
    }

    pub fn stripe_timeout(&self) -> Duration {
        Duration::from_secs(self.stripe_timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}
