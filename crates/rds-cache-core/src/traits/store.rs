//! Remote store capability

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

use crate::{CacheError, DbIndex};

/// Command surface of the remote key-value store
///
/// Every command is scoped to a logical database. Implementations must be
/// safe to share between tasks: one handle serves all callers.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Whether the link to the store is currently up. Never fails.
    fn is_connected(&self) -> bool;

    /// Get a string value
    async fn get(&self, db: DbIndex, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set a string value, optionally expiring after `ttl`
    ///
    /// Returns `true` if the store accepted the write.
    async fn set(
        &self,
        db: DbIndex,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError>;

    /// Delete a key of any type
    ///
    /// Returns `true` if the key existed.
    async fn delete(&self, db: DbIndex, key: &str) -> Result<bool, CacheError>;

    /// Check if a key exists
    async fn exists(&self, db: DbIndex, key: &str) -> Result<bool, CacheError>;

    /// Set one hash field
    ///
    /// Returns `true` if the field was newly created.
    async fn hash_set(
        &self,
        db: DbIndex,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, CacheError>;

    /// Get one hash field
    async fn hash_get(&self, db: DbIndex, key: &str, field: &str)
        -> Result<Option<String>, CacheError>;

    /// Get several hash fields in one round trip
    ///
    /// Returns one slot per requested field, in request order.
    async fn hash_get_many(
        &self,
        db: DbIndex,
        key: &str,
        fields: &[&str],
    ) -> Result<Vec<Option<String>>, CacheError>;

    /// Delete hash fields
    ///
    /// Returns the number of fields that existed and were removed.
    async fn hash_delete(&self, db: DbIndex, key: &str, fields: &[&str])
        -> Result<u64, CacheError>;

    /// Check if a hash field exists
    async fn hash_exists(&self, db: DbIndex, key: &str, field: &str) -> Result<bool, CacheError>;

    /// Add members to a set
    ///
    /// Returns the number of members that were not already present.
    async fn set_add(&self, db: DbIndex, key: &str, members: &[&str]) -> Result<u64, CacheError>;

    /// Remove members from a set
    ///
    /// Returns the number of members that were present.
    async fn set_remove(&self, db: DbIndex, key: &str, members: &[&str])
        -> Result<u64, CacheError>;

    /// Check set membership
    async fn set_contains(&self, db: DbIndex, key: &str, member: &str) -> Result<bool, CacheError>;

    /// List set members
    async fn set_members(&self, db: DbIndex, key: &str) -> Result<HashSet<String>, CacheError>;

    /// Delete every key in one logical database
    async fn flush_db(&self, db: DbIndex) -> Result<(), CacheError>;

    /// Delete every key in every logical database
    async fn flush_all(&self) -> Result<(), CacheError>;

    /// List keys matching a glob pattern on the first endpoint
    async fn keys(&self, db: DbIndex, pattern: &str) -> Result<Vec<String>, CacheError>;
}

/// Opens store handles from a connection target string
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Store handle produced by this connector
    type Store: StoreClient;

    /// Establish a handle for `target`
    async fn connect(&self, target: &str) -> Result<Self::Store, CacheError>;
}
