//! Configuration types, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::pipeline::fallback::FallbackPolicy;
use crate::pipeline::poller::DEFAULT_POLL_INTERVAL_SECS;

/// Default marketplace API base (endpoint paths are appended).
pub const DEFAULT_API_BASE: &str = "https://partner.shopee.com/api/v2";

/// Default instant-answer endpoint for the lookup fallback.
pub const DEFAULT_LOOKUP_URL: &str = "https://api.duckduckgo.com/";

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default response catalog location.
pub const DEFAULT_CATALOG_PATH: &str = "respostas.json";

/// Seller account credentials. All four are required.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub partner_id: String,
    pub api_key: SecretString,
    pub secret_key: SecretString,
    pub shop_id: String,
}

impl Credentials {
    /// Read credentials from `SHOPEE_PARTNER_ID`, `SHOPEE_API_KEY`,
    /// `SHOPEE_SECRET_KEY` and `SHOPEE_SHOP_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        Ok(Self {
            partner_id: required("SHOPEE_PARTNER_ID")?,
            api_key: SecretString::from(required("SHOPEE_API_KEY")?),
            secret_key: SecretString::from(required("SHOPEE_SECRET_KEY")?),
            shop_id: required("SHOPEE_SHOP_ID")?,
        })
    }
}

/// Responder configuration.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// JSON file with the reply templates.
    pub catalog_path: PathBuf,
    /// Sleep between poll cycles.
    pub poll_interval: Duration,
    /// Upper bound on any single marketplace or lookup request.
    pub http_timeout: Duration,
    /// Marketplace API base URL.
    pub api_base: String,
    /// What to do with messages no rule matched.
    pub fallback: FallbackPolicy,
    /// Instant-answer endpoint used by the lookup fallback.
    pub lookup_url: String,
    /// Also write logs to a daily rolling file in this directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            api_base: DEFAULT_API_BASE.to_string(),
            fallback: FallbackPolicy::default(),
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            log_dir: None,
        }
    }
}

impl ResponderConfig {
    /// Build config from environment variables, starting from the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("RESPONDER_CATALOG_PATH") {
            config.catalog_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("RESPONDER_POLL_INTERVAL_SECS") {
            config.poll_interval = positive_secs("RESPONDER_POLL_INTERVAL_SECS", &raw)?;
        }

        if let Some(raw) = lookup("RESPONDER_HTTP_TIMEOUT_SECS") {
            config.http_timeout = positive_secs("RESPONDER_HTTP_TIMEOUT_SECS", &raw)?;
        }

        if let Some(base) = lookup("SHOPEE_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }

        if let Some(policy) = lookup("RESPONDER_FALLBACK") {
            config.fallback = policy.parse()?;
        }

        if let Some(url) = lookup("RESPONDER_LOOKUP_URL") {
            config.lookup_url = url;
        }

        config.log_dir = lookup("RESPONDER_LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

fn positive_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a positive number of seconds, got '{raw}'"),
        })
}
