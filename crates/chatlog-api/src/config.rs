//! Service configuration.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use chatlog_core::StorageOptions;
use chatlog_messaging::ClientConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

const CONFIG_FILE: &str = "chatlog.toml";

/// Environment variables and the configuration keys they set.
const ENV_KEYS: &[(&str, &str)] = &[
    ("LINE_CHANNEL_ACCESS_TOKEN", "channel_access_token"),
    ("LINE_CHANNEL_SECRET", "channel_secret"),
    ("LINE_CHANNEL_ID", "channel_id"),
    ("LINE_USER_ID", "bot_user_id"),
    ("LINE_API_BASE_URL", "api_base_url"),
    ("LINE_API_TIMEOUT", "api_timeout"),
    ("GOLD_PRICE_URL", "gold_price_url"),
    ("DATABASE_URL", "database_url"),
    ("DATABASE_MAX_CONNECTIONS", "database_max_connections"),
    ("DATABASE_ACQUIRE_TIMEOUT", "database_acquire_timeout"),
    ("HOST", "host"),
    ("PORT", "port"),
    ("REQUEST_TIMEOUT", "request_timeout"),
    ("RUST_LOG", "rust_log"),
];

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`chatlog.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Only the channel credentials have no usable default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Channel
    /// Bearer token for the messaging API.
    ///
    /// Environment variable: `LINE_CHANNEL_ACCESS_TOKEN`
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel_access_token: String,
    /// Shared secret used to sign webhook deliveries.
    ///
    /// Environment variable: `LINE_CHANNEL_SECRET`
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel_secret: String,
    /// Channel identifier, reported by `/info`.
    ///
    /// Environment variable: `LINE_CHANNEL_ID`
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel_id: String,
    /// The bot's own user identifier, reported by `/info`.
    ///
    /// Environment variable: `LINE_USER_ID`
    #[serde(default, deserialize_with = "lenient_string")]
    pub bot_user_id: String,

    // Messaging API
    /// Messaging API base URL.
    ///
    /// Environment variable: `LINE_API_BASE_URL`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Messaging API request timeout in seconds.
    ///
    /// Environment variable: `LINE_API_TIMEOUT`
    #[serde(default = "default_api_timeout")]
    pub api_timeout: u64,
    /// Gold quote list URL.
    ///
    /// Environment variable: `GOLD_PRICE_URL`
    #[serde(default = "default_gold_price_url")]
    pub gold_price_url: String,

    // Database
    /// SQLite connection URL.
    ///
    /// Environment variable: `DATABASE_URL`
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Maximum number of database connections in the pool.
    ///
    /// Environment variable: `DATABASE_MAX_CONNECTIONS`
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    /// Database connection acquire timeout in seconds.
    ///
    /// Environment variable: `DATABASE_ACQUIRE_TIMEOUT`
    #[serde(default = "default_acquire_timeout")]
    pub database_acquire_timeout: u64,

    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    // Logging
    /// Log filter directive.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment
    /// variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// Returns the layered configuration sources used by [`Config::load`].
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(env_provider())
    }

    /// Extracts and validates a configuration from `figment`.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Convert to the messaging client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            access_token: self.channel_access_token.clone(),
            timeout: Duration::from_secs(self.api_timeout),
            ..ClientConfig::default()
        }
    }

    /// Convert to storage pool options.
    pub fn to_storage_options(&self) -> StorageOptions {
        StorageOptions {
            max_connections: self.database_max_connections,
            acquire_timeout: Duration::from_secs(self.database_acquire_timeout),
        }
    }

    /// Request timeout applied to every HTTP request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Parse server socket address from host and port configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not form a socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Channel secret with all but the first characters masked, for logging.
    pub fn channel_secret_masked(&self) -> String {
        mask(&self.channel_secret)
    }

    /// Access token with all but the first characters masked, for logging.
    pub fn channel_access_token_masked(&self) -> String {
        mask(&self.channel_access_token)
    }

    fn validate(&self) -> Result<()> {
        if self.channel_access_token.trim().is_empty() {
            anyhow::bail!("LINE_CHANNEL_ACCESS_TOKEN must be set");
        }

        if self.channel_secret.trim().is_empty() {
            anyhow::bail!("LINE_CHANNEL_SECRET must be set");
        }

        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.database_max_connections == 0 {
            anyhow::bail!("database max_connections must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.api_timeout == 0 {
            anyhow::bail!("api_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_access_token: String::new(),
            channel_secret: String::new(),
            channel_id: String::new(),
            bot_user_id: String::new(),
            api_base_url: default_api_base_url(),
            api_timeout: default_api_timeout(),
            gold_price_url: default_gold_price_url(),
            database_url: default_database_url(),
            database_max_connections: default_max_connections(),
            database_acquire_timeout: default_acquire_timeout(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn env_provider() -> Env {
    Env::raw().filter_map(|key| {
        ENV_KEYS
            .iter()
            .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
            .map(|(_, field)| (*field).into())
    })
}

/// Accepts strings and bare numbers; numeric channel ids arrive unquoted
/// from the environment.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Unsigned(value) => value.to_string(),
        Raw::Signed(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}***")
}

fn default_api_base_url() -> String {
    "https://api.line.me".to_string()
}

fn default_api_timeout() -> u64 {
    10
}

fn default_gold_price_url() -> String {
    chatlog_messaging::gold::DEFAULT_GOLD_PRICE_URL.to_string()
}

fn default_database_url() -> String {
    "sqlite://chatlog.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
