//! Lazily constructed, process-wide named cache services

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use rds_cache_core::{CacheMetrics, Codec, Connector, JsonCodec, NoopMetrics};

use crate::service::{CacheService, CacheServiceConfig};
use crate::settings::CacheSettings;

/// Named slot in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheSlot {
    /// General-purpose cache
    Default,
    /// Online-user session cache
    UserSession,
    /// Application cache
    App,
}

impl CacheSlot {
    /// Get slot as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheSlot::Default => "default",
            CacheSlot::UserSession => "user_session",
            CacheSlot::App => "app",
        }
    }
}

/// Service type held by a registry
pub type RegisteredService<C, S, M> = CacheService<<C as Connector>::Store, S, M>;

/// Holder of the three named cache services
///
/// Each slot is built from the settings on first access. Concurrent first
/// accesses build exactly one service and all callers receive it; later
/// accesses are a plain read.
pub struct CacheRegistry<C, S = JsonCodec, M = NoopMetrics>
where
    C: Connector,
    S: Codec,
    M: CacheMetrics + Clone,
{
    connector: C,
    settings: CacheSettings,
    codec: S,
    metrics: M,
    default: OnceCell<Arc<RegisteredService<C, S, M>>>,
    user_session: OnceCell<Arc<RegisteredService<C, S, M>>>,
    app: OnceCell<Arc<RegisteredService<C, S, M>>>,
}

impl<C: Connector> CacheRegistry<C, JsonCodec, NoopMetrics> {
    /// Create a registry with the default JSON codec and no metrics
    pub fn new(connector: C, settings: CacheSettings) -> Self {
        Self::with_codec_and_metrics(connector, settings, JsonCodec, NoopMetrics)
    }
}

impl<C, S, M> CacheRegistry<C, S, M>
where
    C: Connector,
    S: Codec,
    M: CacheMetrics + Clone,
{
    /// Create a registry with custom codec and metrics
    pub fn with_codec_and_metrics(connector: C, settings: CacheSettings, codec: S, metrics: M) -> Self {
        Self {
            connector,
            settings,
            codec,
            metrics,
            default: OnceCell::new(),
            user_session: OnceCell::new(),
            app: OnceCell::new(),
        }
    }

    /// Settings the slots are built from
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// General-purpose cache
    pub async fn default_cache(&self) -> Arc<RegisteredService<C, S, M>> {
        self.get(CacheSlot::Default).await
    }

    /// Online-user session cache
    pub async fn user_session_cache(&self) -> Arc<RegisteredService<C, S, M>> {
        self.get(CacheSlot::UserSession).await
    }

    /// Application cache
    pub async fn app_cache(&self) -> Arc<RegisteredService<C, S, M>> {
        self.get(CacheSlot::App).await
    }

    /// Service in `slot`, building it on first access
    pub async fn get(&self, slot: CacheSlot) -> Arc<RegisteredService<C, S, M>> {
        self.cell(slot)
            .get_or_init(|| self.build(slot))
            .await
            .clone()
    }

    /// Whether `slot` has been built yet
    pub fn is_initialized(&self, slot: CacheSlot) -> bool {
        self.cell(slot).initialized()
    }

    fn cell(&self, slot: CacheSlot) -> &OnceCell<Arc<RegisteredService<C, S, M>>> {
        match slot {
            CacheSlot::Default => &self.default,
            CacheSlot::UserSession => &self.user_session,
            CacheSlot::App => &self.app,
        }
    }

    async fn build(&self, slot: CacheSlot) -> Arc<RegisteredService<C, S, M>> {
        let (target, config) = match slot {
            CacheSlot::Default => (
                self.settings.default_target.as_str(),
                self.settings.default_service_config(),
            ),
            CacheSlot::UserSession => (
                self.settings.user_session_target.as_str(),
                CacheServiceConfig::default(),
            ),
            CacheSlot::App => (
                self.settings.app_target.as_str(),
                CacheServiceConfig::default(),
            ),
        };

        let service = CacheService::connect_with(
            &self.connector,
            target,
            self.codec.clone(),
            self.metrics.clone(),
            config,
        )
        .await;

        info!(
            target: "rds_cache",
            slot = slot.as_str(),
            connected = service.is_connected(),
            enabled = service.is_enabled(),
            "cache service initialized"
        );
        Arc::new(service)
    }
}

#[cfg(feature = "redis")]
pub use global::{global, install, install_from_env};

#[cfg(feature = "redis")]
mod global {
    use std::sync::OnceLock;

    use rds_cache_core::Result;
    use rds_cache_storage::RedisConnector;

    use super::CacheRegistry;
    use crate::settings::CacheSettings;

    static GLOBAL: OnceLock<CacheRegistry<RedisConnector>> = OnceLock::new();

    /// Install the process-wide registry
    ///
    /// The first call wins; later calls return the registry already
    /// installed and ignore their settings.
    pub fn install(settings: CacheSettings) -> &'static CacheRegistry<RedisConnector> {
        GLOBAL.get_or_init(|| {
            let connector = RedisConnector::new().with_connect_timeout(settings.connect_timeout());
            CacheRegistry::new(connector, settings)
        })
    }

    /// Install the process-wide registry from `./config` and the environment
    pub fn install_from_env() -> Result<&'static CacheRegistry<RedisConnector>> {
        if let Some(registry) = GLOBAL.get() {
            return Ok(registry);
        }
        Ok(install(CacheSettings::from_env()?))
    }

    /// The process-wide registry, if installed
    pub fn global() -> Option<&'static CacheRegistry<RedisConnector>> {
        GLOBAL.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_labels() {
        assert_eq!(CacheSlot::Default.as_str(), "default");
        assert_eq!(CacheSlot::UserSession.as_str(), "user_session");
        assert_eq!(CacheSlot::App.as_str(), "app");
    }

    // Single test owns the process-wide registry; slots build lazily, so no
    // server is contacted.
    #[cfg(feature = "redis")]
    #[test]
    fn test_first_install_wins() {
        assert!(global().is_none());

        let first = install(CacheSettings {
            default_target: "cache1:6379".to_string(),
            ..Default::default()
        });
        let second = install(CacheSettings {
            default_target: "cache2:6379".to_string(),
            enable_cache: false,
            ..Default::default()
        });

        assert!(std::ptr::eq(first, second));
        assert_eq!(second.settings().default_target, "cache1:6379");
        assert!(second.settings().enable_cache);
        assert!(std::ptr::eq(global().unwrap(), first));
        assert!(std::ptr::eq(install_from_env().unwrap(), first));
        assert!(!first.is_initialized(CacheSlot::Default));
    }
}
