//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use storefront_auth::AdminToken;
use storefront_payments::RazorpayConfig;
use storefront_payments::gateway::{DEFAULT_API_BASE, DEFAULT_TIMEOUT};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct AppConfig {
    pub razorpay: RazorpayConfig,
    /// Webhooks are rejected when unset.
    pub webhook_secret: Option<String>,
    /// Admin requests are rejected when unset.
    pub admin_token: Option<AdminToken>,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    /// JSON file seeding the in-memory catalog, settings and delivery zones.
    pub seed_path: Option<PathBuf>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("razorpay", &self.razorpay)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<REDACTED>"))
            .field("admin_token", &self.admin_token)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("database_url", &self.database_url.as_ref().map(|_| "<REDACTED>"))
            .field("bind_addr", &self.bind_addr)
            .field("seed_path", &self.seed_path)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let timeout = match get("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    name: "PROVIDER_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => DEFAULT_TIMEOUT,
        };

        let razorpay = RazorpayConfig {
            key_id: required("RAZORPAY_KEY_ID")?,
            key_secret: required("RAZORPAY_KEY_SECRET")?,
            api_base: get("RAZORPAY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout,
        };

        let use_persistent_stores = get("USE_PERSISTENT_STORES")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let database_url = get("DATABASE_URL");
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let raw_bind = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_bind.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: raw_bind.clone(),
        })?;

        Ok(Self {
            razorpay,
            webhook_secret: get("RAZORPAY_WEBHOOK_SECRET"),
            admin_token: get("ADMIN_TOKEN").and_then(AdminToken::new),
            use_persistent_stores,
            database_url,
            bind_addr,
            seed_path: get("STOREFRONT_SEED").map(PathBuf::from),
        })
    }
}
