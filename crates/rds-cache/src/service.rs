//! Fail-silent cache facade over one store connection

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use rds_cache_core::{
    build_key, CacheError, CacheKey, CacheMetrics, CacheOperation, Codec, Connector, DbIndex,
    ExpiryPolicy, JsonCodec, NoopMetrics, Result, StoreClient, LEGACY_DB,
};

/// Configuration for CacheService
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheServiceConfig {
    /// When false every operation returns its default without touching the store
    pub enabled: bool,
    /// Default and long expiry windows used by `add`
    pub expiry: ExpiryPolicy,
}

impl Default for CacheServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expiry: ExpiryPolicy::none(),
        }
    }
}

impl CacheServiceConfig {
    /// Create config with specific expiry windows
    pub fn with_expiry(expiry: ExpiryPolicy) -> Self {
        Self {
            expiry,
            ..Default::default()
        }
    }

    /// Switch caching off
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Cache facade bound to one store connection
///
/// Every public operation is best-effort: when caching is disabled, when no
/// connection was ever established, or when the store or codec fails, the
/// operation returns its documented default (`false`, `0`, `None`, `()`)
/// instead of an error. Each operation has a `try_` twin returning the
/// underlying `Result`.
///
/// Generic over:
/// - `B`: The store client (Memory, Redis)
/// - `S`: The codec (JSON, MessagePack, Bincode)
/// - `M`: The metrics collector
pub struct CacheService<B, S = JsonCodec, M = NoopMetrics>
where
    B: StoreClient,
    S: Codec,
    M: CacheMetrics,
{
    store: Option<Arc<B>>,
    codec: S,
    metrics: Arc<M>,
    config: CacheServiceConfig,
}

// Constructors for default codec/metrics
impl<B: StoreClient> CacheService<B, JsonCodec, NoopMetrics> {
    /// Create a service over an established store handle
    pub fn new(store: B) -> Self {
        Self::with_config(store, CacheServiceConfig::default())
    }

    /// Create with custom config
    pub fn with_config(store: B, config: CacheServiceConfig) -> Self {
        Self::with_codec_and_metrics(Some(store), JsonCodec, NoopMetrics, config)
    }

    /// Create a service that never got a connection
    pub fn disconnected(config: CacheServiceConfig) -> Self {
        Self::with_codec_and_metrics(None, JsonCodec, NoopMetrics, config)
    }

    /// Connect to `target` and wrap the result
    ///
    /// A failed or skipped connection still yields a service; all its
    /// operations are then no-ops.
    pub async fn connect<C>(connector: &C, target: &str, config: CacheServiceConfig) -> Self
    where
        C: Connector<Store = B>,
    {
        Self::connect_with(connector, target, JsonCodec, NoopMetrics, config).await
    }
}

// Full generic implementation
impl<B, S, M> CacheService<B, S, M>
where
    B: StoreClient,
    S: Codec,
    M: CacheMetrics,
{
    /// Create a CacheService with custom codec and metrics
    pub fn with_codec_and_metrics(
        store: Option<B>,
        codec: S,
        metrics: M,
        config: CacheServiceConfig,
    ) -> Self {
        Self {
            store: store.map(Arc::new),
            codec,
            metrics: Arc::new(metrics),
            config,
        }
    }

    /// Connect with custom codec and metrics
    pub async fn connect_with<C>(
        connector: &C,
        target: &str,
        codec: S,
        metrics: M,
        config: CacheServiceConfig,
    ) -> Self
    where
        C: Connector<Store = B>,
    {
        let store = if target.trim().is_empty() {
            debug!(target: "rds_cache", "no connection target; cache operations are no-ops");
            None
        } else {
            match connector.connect(target).await {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(
                        target: "rds_cache",
                        error = %e,
                        "cache connection failed; operations are no-ops"
                    );
                    None
                }
            }
        };

        Self::with_codec_and_metrics(store, codec, metrics, config)
    }

    /// Whether caching is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether the store link is up; false when no connection exists
    pub fn is_connected(&self) -> bool {
        self.store.as_ref().is_some_and(|s| s.is_connected())
    }

    /// Default expiry window
    pub fn default_expiry(&self) -> Option<Duration> {
        self.config.expiry.default
    }

    /// Long expiry window
    pub fn long_expiry(&self) -> Option<Duration> {
        self.config.expiry.long
    }

    /// Compose a key from a base name and parameters, skipping `None` values
    pub fn build_key<I, K, V>(&self, name: &str, params: I) -> String
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        V: Display,
    {
        build_key(name, params)
    }

    fn store(&self) -> Result<&B> {
        if !self.config.enabled {
            return Err(CacheError::Disabled);
        }
        self.store.as_deref().ok_or_else(|| {
            CacheError::ConnectionUnavailable("no connection established".to_string())
        })
    }

    /// Map any failure to the operation's default result
    fn settle<T: Default>(
        &self,
        operation: CacheOperation,
        key: &str,
        started: Instant,
        result: Result<T>,
    ) -> T {
        self.metrics.record_latency(operation, started.elapsed());
        match result {
            Ok(value) => value,
            Err(e) => {
                if e != CacheError::Disabled {
                    debug!(
                        target: "rds_cache",
                        operation = operation.as_str(),
                        key = %key,
                        error = %e,
                        "cache operation degraded"
                    );
                }
                self.metrics.record_degraded(operation, &e);
                T::default()
            }
        }
    }

    // ---- strings ----

    /// Store `value` under `key` in `db`, optionally expiring
    pub async fn try_string_set<T>(
        &self,
        key: &str,
        value: &T,
        db: DbIndex,
        expiry: Option<Duration>,
    ) -> Result<bool>
    where
        T: Serialize + ?Sized,
    {
        let store = self.store()?;
        let bytes = self.codec.encode(value)?;
        store.set(db, key, bytes, expiry).await
    }

    /// Store `value`; returns true iff the write succeeded
    pub async fn string_set<T>(
        &self,
        key: impl CacheKey,
        value: &T,
        db: DbIndex,
        expiry: Option<Duration>,
    ) -> bool
    where
        T: Serialize + ?Sized,
    {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_string_set(&key, value, db, expiry).await;
        self.settle(CacheOperation::StringSet, &key, started, result)
    }

    /// Read and decode the value under `key` in `db`
    pub async fn try_string_get<T>(&self, key: &str, db: DbIndex) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let store = self.store()?;
        let value = match store.get(db, key).await? {
            Some(bytes) => self.codec.decode(&bytes)?,
            None => None,
        };

        if value.is_some() {
            self.metrics.record_hit(key);
        } else {
            self.metrics.record_miss(key);
        }
        Ok(value)
    }

    /// Read a value; `None` on miss or any failure
    pub async fn string_get<T>(&self, key: impl CacheKey, db: DbIndex) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_string_get(&key, db).await;
        self.settle(CacheOperation::StringGet, &key, started, result)
    }

    // ---- keys ----

    /// Check if a key exists in `db`
    pub async fn try_exists(&self, key: &str, db: DbIndex) -> Result<bool> {
        self.store()?.exists(db, key).await
    }

    /// Check if a key exists in the legacy database
    ///
    /// Always database 0; the connection target's `defaultDatabase` is not
    /// consulted.
    pub async fn exists(&self, key: impl CacheKey) -> bool {
        self.exists_in(key, LEGACY_DB).await
    }

    /// Check if a key exists in `db`
    pub async fn exists_in(&self, key: impl CacheKey, db: DbIndex) -> bool {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_exists(&key, db).await;
        self.settle(CacheOperation::Exists, &key, started, result)
    }

    /// Delete a key from `db`; true if it existed
    pub async fn try_remove(&self, key: &str, db: DbIndex) -> Result<bool> {
        self.store()?.delete(db, key).await
    }

    /// Delete a key from the legacy database
    ///
    /// Always database 0; the connection target's `defaultDatabase` is not
    /// consulted.
    pub async fn remove(&self, key: impl CacheKey) {
        self.remove_key(key, LEGACY_DB).await
    }

    /// Delete a key from `db`
    pub async fn remove_key(&self, key: impl CacheKey, db: DbIndex) {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_remove(&key, db).await.map(|_| ());
        self.settle(CacheOperation::Remove, &key, started, result)
    }

    // ---- legacy untyped family (database 0, whatever the target's defaultDatabase) ----

    /// Store `value` with the default expiry, or the long one if `long_time`
    pub async fn add<T>(&self, key: impl CacheKey, value: &T, long_time: bool)
    where
        T: Serialize + ?Sized,
    {
        let expiry = self.config.expiry.select(long_time);
        self.string_set(key, value, LEGACY_DB, expiry).await;
    }

    /// Store `value` without expiry
    pub async fn put<T>(&self, key: impl CacheKey, value: &T)
    where
        T: Serialize + ?Sized,
    {
        self.string_set(key, value, LEGACY_DB, None).await;
    }

    /// Store `value` expiring after `duration`
    pub async fn put_for<T>(&self, key: impl CacheKey, value: &T, duration: Duration)
    where
        T: Serialize + ?Sized,
    {
        self.string_set(key, value, LEGACY_DB, Some(duration)).await;
    }

    /// Read and decode a value from the legacy database
    ///
    /// Always database 0; the connection target's `defaultDatabase` is not
    /// consulted.
    pub async fn get<T>(&self, key: impl CacheKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.string_get(key, LEGACY_DB).await
    }

    /// Read the undecoded bytes under `key` in `db`
    pub async fn try_get_raw(&self, key: &str, db: DbIndex) -> Result<Option<Vec<u8>>> {
        self.store()?.get(db, key).await
    }

    /// Read the undecoded bytes from the legacy database
    ///
    /// Always database 0; the connection target's `defaultDatabase` is not
    /// consulted.
    pub async fn get_raw(&self, key: impl CacheKey) -> Option<Vec<u8>> {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_get_raw(&key, LEGACY_DB).await;
        self.settle(CacheOperation::StringGet, &key, started, result)
    }

    // ---- hashes ----

    /// Set one hash field; true if the field was new
    pub async fn try_hash_set(
        &self,
        key: &str,
        field: &str,
        value: &str,
        db: DbIndex,
    ) -> Result<bool> {
        self.store()?.hash_set(db, key, field, value).await
    }

    /// Set one hash field
    pub async fn hash_set(&self, key: impl CacheKey, field: &str, value: &str, db: DbIndex) {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_hash_set(&key, field, value, db).await.map(|_| ());
        self.settle(CacheOperation::HashSet, &key, started, result)
    }

    /// Set several hash fields, one command per field in iteration order
    ///
    /// Not atomic: a failing field does not stop the rest. Returns the
    /// number of fields written, or the first error met.
    pub async fn try_hash_set_many<I, F, V>(&self, key: &str, entries: I, db: DbIndex) -> Result<u64>
    where
        I: IntoIterator<Item = (F, V)>,
        F: AsRef<str>,
        V: AsRef<str>,
    {
        let store = self.store()?;
        let mut written = 0;
        let mut first_error = None;

        for (field, value) in entries {
            match store.hash_set(db, key, field.as_ref(), value.as_ref()).await {
                Ok(_) => written += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// Set several hash fields
    pub async fn hash_set_many<I, F, V>(&self, key: impl CacheKey, entries: I, db: DbIndex)
    where
        I: IntoIterator<Item = (F, V)>,
        F: AsRef<str>,
        V: AsRef<str>,
    {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_hash_set_many(&key, entries, db).await.map(|_| ());
        self.settle(CacheOperation::HashSet, &key, started, result)
    }

    /// Get one hash field
    pub async fn try_hash_get(&self, key: &str, field: &str, db: DbIndex) -> Result<Option<String>> {
        self.store()?.hash_get(db, key, field).await
    }

    /// Get one hash field; `None` if absent or on failure
    pub async fn hash_get(&self, key: impl CacheKey, field: &str, db: DbIndex) -> Option<String> {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_hash_get(&key, field, db).await;
        self.settle(CacheOperation::HashGet, &key, started, result)
    }

    /// Get several hash fields in one round trip
    pub async fn try_hash_get_many(
        &self,
        key: &str,
        fields: &[&str],
        db: DbIndex,
    ) -> Result<Vec<Option<String>>> {
        self.store()?.hash_get_many(db, key, fields).await
    }

    /// Get several hash fields, in request order; `None` on failure
    pub async fn hash_get_many(
        &self,
        key: impl CacheKey,
        fields: &[&str],
        db: DbIndex,
    ) -> Option<Vec<Option<String>>> {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_hash_get_many(&key, fields, db).await.map(Some);
        self.settle(CacheOperation::HashGet, &key, started, result)
    }

    /// Delete hash fields; number actually removed
    pub async fn try_hash_delete_fields(&self, key: &str, fields: &[&str], db: DbIndex) -> Result<u64> {
        self.store()?.hash_delete(db, key, fields).await
    }

    /// Delete one hash field; true iff it existed
    pub async fn hash_delete_field(&self, key: impl CacheKey, field: &str, db: DbIndex) -> bool {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self
            .try_hash_delete_fields(&key, &[field], db)
            .await
            .map(|n| n > 0);
        self.settle(CacheOperation::HashDelete, &key, started, result)
    }

    /// Delete several hash fields; number actually removed
    pub async fn hash_delete_fields(&self, key: impl CacheKey, fields: &[&str], db: DbIndex) -> u64 {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_hash_delete_fields(&key, fields, db).await;
        self.settle(CacheOperation::HashDelete, &key, started, result)
    }

    /// Check if a hash field exists
    pub async fn try_hash_exists(&self, key: &str, field: &str, db: DbIndex) -> Result<bool> {
        self.store()?.hash_exists(db, key, field).await
    }

    /// Check if a hash field exists
    pub async fn hash_exists(&self, key: impl CacheKey, field: &str, db: DbIndex) -> bool {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_hash_exists(&key, field, db).await;
        self.settle(CacheOperation::HashExists, &key, started, result)
    }

    // ---- sets ----

    /// Add members; number newly added
    pub async fn try_add_set(&self, key: &str, values: &[&str], db: DbIndex) -> Result<u64> {
        self.store()?.set_add(db, key, values).await
    }

    /// Add one member; true iff it was new
    pub async fn add_set(&self, key: impl CacheKey, value: &str, db: DbIndex) -> bool {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_add_set(&key, &[value], db).await.map(|n| n > 0);
        self.settle(CacheOperation::SetAdd, &key, started, result)
    }

    /// Add several members; duplicates and existing members are not counted
    pub async fn add_set_many(&self, key: impl CacheKey, values: &[&str], db: DbIndex) -> u64 {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_add_set(&key, values, db).await;
        self.settle(CacheOperation::SetAdd, &key, started, result)
    }

    /// List members
    pub async fn try_get_set(&self, key: &str, db: DbIndex) -> Result<HashSet<String>> {
        self.store()?.set_members(db, key).await
    }

    /// List members; `None` on failure
    pub async fn get_set(&self, key: impl CacheKey, db: DbIndex) -> Option<HashSet<String>> {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_get_set(&key, db).await.map(Some);
        self.settle(CacheOperation::SetMembers, &key, started, result)
    }

    /// Remove members; number actually removed
    pub async fn try_set_remove(&self, key: &str, items: &[&str], db: DbIndex) -> Result<u64> {
        self.store()?.set_remove(db, key, items).await
    }

    /// Remove one member; true iff it was present
    pub async fn set_remove(&self, key: impl CacheKey, item: &str, db: DbIndex) -> bool {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_set_remove(&key, &[item], db).await.map(|n| n > 0);
        self.settle(CacheOperation::SetRemove, &key, started, result)
    }

    /// Remove several members; number actually removed
    pub async fn set_remove_many(&self, key: impl CacheKey, items: &[&str], db: DbIndex) -> u64 {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_set_remove(&key, items, db).await;
        self.settle(CacheOperation::SetRemove, &key, started, result)
    }

    /// Check membership
    pub async fn try_set_contains(&self, key: &str, item: &str, db: DbIndex) -> Result<bool> {
        self.store()?.set_contains(db, key, item).await
    }

    /// Check membership
    pub async fn set_contains(&self, key: impl CacheKey, item: &str, db: DbIndex) -> bool {
        let key = key.cache_key();
        let started = Instant::now();
        let result = self.try_set_contains(&key, item, db).await;
        self.settle(CacheOperation::SetContains, &key, started, result)
    }

    // ---- administration ----

    /// Delete every key in `db`
    pub async fn try_flush_db(&self, db: DbIndex) -> Result<()> {
        self.store()?.flush_db(db).await
    }

    /// Delete every key in `db`. Irreversible.
    pub async fn flush_db(&self, db: DbIndex) {
        let started = Instant::now();
        let result = self.try_flush_db(db).await;
        self.settle(CacheOperation::FlushDb, "*", started, result)
    }

    /// Delete every key in every database
    pub async fn try_flush_all_db(&self) -> Result<()> {
        self.store()?.flush_all().await
    }

    /// Delete every key in every database. Irreversible.
    pub async fn flush_all_db(&self) {
        let started = Instant::now();
        let result = self.try_flush_all_db().await;
        self.settle(CacheOperation::FlushAll, "*", started, result)
    }

    /// List keys in `db` matching a glob pattern
    pub async fn try_get_keys(&self, pattern: &str, db: DbIndex) -> Result<Vec<String>> {
        self.store()?.keys(db, pattern).await
    }

    /// List keys in `db` matching a glob pattern; empty on failure
    ///
    /// Walks the whole keyspace on the server. Diagnostic use only.
    pub async fn get_keys(&self, pattern: &str, db: DbIndex) -> Vec<String> {
        let started = Instant::now();
        let result = self.try_get_keys(pattern, db).await;
        self.settle(CacheOperation::Keys, pattern, started, result)
    }
}
