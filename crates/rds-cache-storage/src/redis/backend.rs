use async_trait::async_trait;
use bb8::{Pool, PooledConnection, RunError};
use bb8_redis::RedisConnectionManager;
use dashmap::DashMap;
use redis::{AsyncCommands, RedisError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use rds_cache_core::{CacheError, Connector, DbIndex, Result, StoreClient};

use super::config::ConnectionOptions;

const SCAN_COUNT: usize = 1000;

fn map_redis_error(e: RedisError) -> CacheError {
    if e.is_timeout() {
        CacheError::Timeout
    } else if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        CacheError::Connection(e.to_string())
    } else {
        CacheError::Backend(e.to_string())
    }
}

fn map_pool_error(e: RunError<RedisError>) -> CacheError {
    match e {
        RunError::User(e) => map_redis_error(e),
        RunError::TimedOut => CacheError::Timeout,
    }
}

/// Redis store
///
/// Keeps one bb8 pool per logical database, created on first use. Cloning
/// shares the pools.
#[derive(Clone)]
pub struct RedisStore {
    pools: Arc<DashMap<DbIndex, Pool<RedisConnectionManager>>>,
    options: Arc<ConnectionOptions>,
    connected: Arc<AtomicBool>,
}

impl RedisStore {
    /// Connect to the first endpoint of `options`
    ///
    /// Fails unless the default database answers a PING.
    pub async fn connect(options: ConnectionOptions) -> Result<Self> {
        let store = Self {
            pools: Arc::new(DashMap::new()),
            options: Arc::new(options),
            connected: Arc::new(AtomicBool::new(false)),
        };

        let mut conn = store.get_connection(store.options.default_database).await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        debug!(target: "rds_cache", reply = %pong, "redis store connected");
        store.connected.store(true, Ordering::SeqCst);

        Ok(store)
    }

    /// Options this store was opened with
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Get or build the pool for a logical database
    async fn pool(&self, db: DbIndex) -> Result<Pool<RedisConnectionManager>> {
        if let Some(pool) = self.pools.get(&db) {
            return Ok(pool.clone());
        }

        let manager = RedisConnectionManager::new(self.options.url_for(db)?)
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(self.options.pool_size)
            .connection_timeout(self.options.connect_timeout)
            .build(manager)
            .await
            .map_err(map_redis_error)?;

        // Another task may have raced us here; keep whichever landed first
        Ok(self.pools.entry(db).or_insert(pool).clone())
    }

    /// Get connection from the pool of `db`
    async fn get_connection(
        &self,
        db: DbIndex,
    ) -> Result<PooledConnection<'static, RedisConnectionManager>> {
        let pool = self.pool(db).await?;
        let conn = pool.get_owned().await.map_err(map_pool_error);
        self.track(conn)
    }

    /// Keep the link state in step with command outcomes
    fn track<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.connected.store(true, Ordering::SeqCst),
            Err(e) if e.is_connection() => {
                if self.connected.swap(false, Ordering::SeqCst) {
                    warn!(target: "rds_cache", error = %e, "redis link lost");
                }
            }
            Err(_) => {}
        }
        result
    }

    fn require_admin(&self) -> Result<()> {
        if self.options.allow_admin {
            Ok(())
        } else {
            Err(CacheError::Backend(
                "admin commands are not allowed on this connection".to_string(),
            ))
        }
    }
}

#[async_trait]
impl StoreClient for RedisStore {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get(&self, db: DbIndex, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection(db).await?;
        let result = conn.get(key).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn set(
        &self,
        db: DbIndex,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let mut conn = self.get_connection(db).await?;

        let result: Result<()> = match ttl.filter(|d| !d.is_zero()) {
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex(key, value, millis).await
            }
            None => conn.set(key, value).await,
        }
        .map_err(map_redis_error);

        self.track(result).map(|_| true)
    }

    async fn delete(&self, db: DbIndex, key: &str) -> Result<bool> {
        let mut conn = self.get_connection(db).await?;
        let result: Result<u64> = conn.del(key).await.map_err(map_redis_error);
        self.track(result).map(|n| n > 0)
    }

    async fn exists(&self, db: DbIndex, key: &str) -> Result<bool> {
        let mut conn = self.get_connection(db).await?;
        let result = conn.exists(key).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn hash_set(&self, db: DbIndex, key: &str, field: &str, value: &str) -> Result<bool> {
        let mut conn = self.get_connection(db).await?;
        let result: Result<u64> = conn.hset(key, field, value).await.map_err(map_redis_error);
        self.track(result).map(|n| n > 0)
    }

    async fn hash_get(&self, db: DbIndex, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection(db).await?;
        let result = conn.hget(key, field).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn hash_get_many(
        &self,
        db: DbIndex,
        key: &str,
        fields: &[&str],
    ) -> Result<Vec<Option<String>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.get_connection(db).await?;
        let result = redis::cmd("HMGET")
            .arg(key)
            .arg(fields)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error);
        self.track(result)
    }

    async fn hash_delete(&self, db: DbIndex, key: &str, fields: &[&str]) -> Result<u64> {
        if fields.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_connection(db).await?;
        let result = conn.hdel(key, fields).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn hash_exists(&self, db: DbIndex, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.get_connection(db).await?;
        let result = conn.hexists(key, field).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn set_add(&self, db: DbIndex, key: &str, members: &[&str]) -> Result<u64> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_connection(db).await?;
        let result = conn.sadd(key, members).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn set_remove(&self, db: DbIndex, key: &str, members: &[&str]) -> Result<u64> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_connection(db).await?;
        let result = conn.srem(key, members).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn set_contains(&self, db: DbIndex, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.get_connection(db).await?;
        let result = conn.sismember(key, member).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn set_members(&self, db: DbIndex, key: &str) -> Result<HashSet<String>> {
        let mut conn = self.get_connection(db).await?;
        let result = conn.smembers(key).await.map_err(map_redis_error);
        self.track(result)
    }

    async fn flush_db(&self, db: DbIndex) -> Result<()> {
        self.require_admin()?;
        let mut conn = self.get_connection(db).await?;
        let result = redis::cmd("FLUSHDB")
            .query_async::<()>(&mut *conn)
            .await
            .map_err(map_redis_error);
        self.track(result)
    }

    async fn flush_all(&self) -> Result<()> {
        self.require_admin()?;
        let mut conn = self.get_connection(self.options.default_database).await?;
        let result = redis::cmd("FLUSHALL")
            .query_async::<()>(&mut *conn)
            .await
            .map_err(map_redis_error);
        self.track(result)
    }

    async fn keys(&self, db: DbIndex, pattern: &str) -> Result<Vec<String>> {
        self.require_admin()?;
        let mut conn = self.get_connection(db).await?;

        let mut cursor = 0u64;
        let mut keys = Vec::new();

        loop {
            let page: Result<(u64, Vec<String>)> = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut *conn)
                .await
                .map_err(map_redis_error);
            let (next_cursor, batch) = self.track(page)?;

            keys.extend(batch);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

/// Connector that parses the target and opens a `RedisStore`
///
/// Admin commands are always enabled on the parsed options.
#[derive(Debug, Clone, Default)]
pub struct RedisConnector {
    connect_timeout: Option<Duration>,
}

impl RedisConnector {
    /// Create a connector using each target's own timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the connection timeout of every target
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Connector for RedisConnector {
    type Store = RedisStore;

    async fn connect(&self, target: &str) -> Result<RedisStore> {
        let mut options = ConnectionOptions::parse(target)?.allow_admin(true);
        if let Some(timeout) = self.connect_timeout {
            options = options.connect_timeout(timeout);
        }
        RedisStore::connect(options).await
    }
}
