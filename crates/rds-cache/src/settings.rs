//! Cache settings with layered sources

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use rds_cache_core::{CacheError, ExpiryPolicy, Result};

use crate::service::CacheServiceConfig;

/// Prefix of environment variables read by [`CacheSettings::load`]
pub const ENV_PREFIX: &str = "RDS_CACHE";

/// Settings for the registry's named caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Connection target of the general-purpose cache
    pub default_target: String,
    /// Connection target of the online-user session cache
    pub user_session_target: String,
    /// Connection target of the application cache
    pub app_target: String,
    /// Master switch for the general-purpose cache
    pub enable_cache: bool,
    /// Default expiry, hour component
    pub cache_hours: u64,
    /// Default expiry, minute component
    pub cache_minutes: u64,
    /// Long expiry in hours
    pub cache_long_hours: u64,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_target: String::new(),
            user_session_target: String::new(),
            app_target: String::new(),
            enable_cache: true,
            cache_hours: 1,
            cache_minutes: 0,
            cache_long_hours: 24,
            connect_timeout_ms: 5_000,
        }
    }
}

impl CacheSettings {
    /// Load settings from `dir` and the environment.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `{dir}/default.toml`
    /// 2. `{dir}/local.toml`
    /// 3. Environment variables with `RDS_CACHE__` prefix, e.g.
    ///    `RDS_CACHE__ENABLE_CACHE=false`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            debug!(target: "rds_cache", "No .env file loaded: {}", e);
        }
        Self::load_with_prefix(dir.as_ref(), ENV_PREFIX)
    }

    /// Load settings from the default location (`./config`)
    pub fn from_env() -> Result<Self> {
        Self::load("./config")
    }

    fn load_with_prefix(dir: &Path, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        for name in ["default.toml", "local.toml"] {
            let path = dir.join(name);
            if path.exists() {
                debug!(target: "rds_cache", path = %path.display(), "loading cache settings");
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| CacheError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject expiry components whose total does not fit in seconds
    pub fn validate(&self) -> Result<()> {
        let default = self
            .cache_hours
            .checked_mul(3600)
            .and_then(|h| self.cache_minutes.checked_mul(60).and_then(|m| h.checked_add(m)));
        if default.is_none() {
            return Err(CacheError::Config(format!(
                "cache_hours {} / cache_minutes {} out of range",
                self.cache_hours, self.cache_minutes
            )));
        }
        if self.cache_long_hours.checked_mul(3600).is_none() {
            return Err(CacheError::Config(format!(
                "cache_long_hours {} out of range",
                self.cache_long_hours
            )));
        }
        Ok(())
    }

    /// Expiry windows of the general-purpose cache
    pub fn expiry(&self) -> ExpiryPolicy {
        ExpiryPolicy::from_components(self.cache_hours, self.cache_minutes, self.cache_long_hours)
    }

    /// Service config of the general-purpose cache
    pub fn default_service_config(&self) -> CacheServiceConfig {
        CacheServiceConfig {
            enabled: self.enable_cache,
            expiry: self.expiry(),
        }
    }

    /// Connection timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
