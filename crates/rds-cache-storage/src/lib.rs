//! rds-cache-storage: Store clients for rds-cache

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "memory")]
pub use memory::{MemoryConfig, MemoryConnector, MemoryStore};

#[cfg(feature = "redis")]
pub use self::redis::{ConnectionOptions, RedisConnector, RedisStore};
