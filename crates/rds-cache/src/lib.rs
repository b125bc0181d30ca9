//! rds-cache: Fail-silent caching facade over a remote key-value store
//!
//! # Features
//!
//! - **Typed string values** through a pluggable codec (JSON, MessagePack, Bincode)
//! - **Hash and set collections** per logical database
//! - **Best-effort semantics**: failures look like cache misses, never errors
//! - **Named, lazily built services** in a process-wide registry
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rds_cache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = CacheService::new(MemoryStore::with_defaults());
//!
//!     cache.string_set("key", &42i32, DEFAULT_DB, None).await;
//!
//!     match cache.string_get::<i32>("key", DEFAULT_DB).await {
//!         Some(value) => println!("Got: {}", value),
//!         None => println!("Cache miss"),
//!     }
//! }
//! ```

mod registry;
mod service;
mod settings;

// Re-export core
pub use rds_cache_core::*;

// Re-export storage
#[cfg(feature = "memory")]
pub use rds_cache_storage::{MemoryConfig, MemoryConnector, MemoryStore};

#[cfg(feature = "redis")]
pub use rds_cache_storage::{ConnectionOptions, RedisConnector, RedisStore};

pub use registry::{CacheRegistry, CacheSlot, RegisteredService};
pub use service::{CacheService, CacheServiceConfig};
pub use settings::{CacheSettings, ENV_PREFIX};

#[cfg(feature = "redis")]
pub use registry::{global, install, install_from_env};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        build_key, CacheError, CacheKey, CacheRegistry, CacheService, CacheServiceConfig,
        CacheSettings, CacheSlot, Codec, ExpiryPolicy, JsonCodec, KeyBuilder, Result,
        DEFAULT_DB, LEGACY_DB,
    };

    #[cfg(feature = "memory")]
    pub use crate::{MemoryConfig, MemoryConnector, MemoryStore};

    #[cfg(feature = "redis")]
    pub use crate::{RedisConnector, RedisStore};

    #[cfg(feature = "msgpack")]
    pub use crate::MsgPackCodec;

    #[cfg(feature = "bincode")]
    pub use crate::BincodeCodec;
}
