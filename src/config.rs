//! Configuration management for the UnicalRent client

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Request timeout; unset means the transport default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token issued by the identity provider
    #[serde(default)]
    pub token: Option<String>,
    /// File used to persist the token between runs
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

/// Business rules applied to drafts and cancellations
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BookingRules {
    pub min_duration_minutes: i64,
    pub cancellation_notice_hours: i64,
    pub cancellation_penalty_rate: Decimal,
    pub availability_horizon_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EventsConfig {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingRules,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // UNICALRENT_BOOKING__MIN_DURATION_MINUTES=90 and friends
            .add_source(
                Environment::with_prefix("UNICALRENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("api.base_url", env::var("UNICALRENT_API_URL").ok())?
            .set_override_option("auth.token", env::var("UNICALRENT_TOKEN").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: None,
            user_agent: format!("unicalrent/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            min_duration_minutes: 60,
            cancellation_notice_hours: 2,
            cancellation_penalty_rate: Decimal::new(20, 2),
            availability_horizon_days: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}
