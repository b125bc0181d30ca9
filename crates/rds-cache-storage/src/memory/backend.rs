//! In-memory store using DashMap

use async_trait::async_trait;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rds_cache_core::{CacheError, Connector, DbIndex, Result, StoreClient};

use super::glob::glob_match;

/// Configuration for the memory store
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Number of logical databases (indexes `0..databases`)
    pub databases: DbIndex,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { databases: 16 }
    }
}

impl MemoryConfig {
    /// Create config with a specific number of logical databases
    pub fn with_databases(databases: DbIndex) -> Self {
        Self { databases }
    }
}

#[derive(Debug, Clone)]
enum StoredValue {
    Bytes(Vec<u8>),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: StoredValue,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn new(value: StoredValue, ttl: Option<Duration>) -> Self {
        Self {
            value,
            // An expiry past the clock's range never fires
            expires_at: ttl.and_then(|d| Instant::now().checked_add(d)),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }

    fn is_empty_collection(&self) -> bool {
        match &self.value {
            StoredValue::Bytes(_) => false,
            StoredValue::Hash(fields) => fields.is_empty(),
            StoredValue::Set(members) => members.is_empty(),
        }
    }
}

type EntryKey = (DbIndex, String);

fn wrong_type() -> CacheError {
    CacheError::Backend(
        "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
    )
}

/// In-process stand-in for the remote store
///
/// Keeps strings, hashes and sets per logical database with per-key expiry.
/// Cloning creates a new handle to the SAME underlying store.
#[derive(Clone)]
pub struct MemoryStore {
    /// Main data store
    data: Arc<DashMap<EntryKey, StoredEntry>>,
    /// Simulated link state
    connected: Arc<AtomicBool>,
    /// Serializes whole-store flushes against key scans
    flush_lock: Arc<RwLock<()>>,
    config: MemoryConfig,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            connected: Arc::new(AtomicBool::new(true)),
            flush_lock: Arc::new(RwLock::new(())),
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Simulate the link going down or coming back
    ///
    /// While disconnected every command fails with `CacheError::Connection`.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of live keys across all databases
    pub fn len(&self) -> usize {
        self.data.iter().filter(|e| !e.value().is_expired()).count()
    }

    /// Whether the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, db: DbIndex) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("memory store disconnected".to_string()));
        }
        if db >= self.config.databases {
            return Err(CacheError::Backend("ERR DB index is out of range".to_string()));
        }
        Ok(())
    }

    /// Look up a live entry, dropping it first if it has expired
    fn live(&self, db: DbIndex, key: &str) -> Option<RefMut<'_, EntryKey, StoredEntry>> {
        let entry_key = (db, key.to_string());
        self.data.remove_if(&entry_key, |_, entry| entry.is_expired());
        self.data.get_mut(&entry_key)
    }

    /// Drop a hash or set that has become empty
    fn prune(&self, db: DbIndex, key: &str) {
        self.data
            .remove_if(&(db, key.to_string()), |_, entry| entry.is_empty_collection());
    }

    fn hash_entry(&self, db: DbIndex, key: &str) -> RefMut<'_, EntryKey, StoredEntry> {
        let entry_key = (db, key.to_string());
        self.data.remove_if(&entry_key, |_, entry| entry.is_expired());
        self.data
            .entry(entry_key)
            .or_insert_with(|| StoredEntry::new(StoredValue::Hash(HashMap::new()), None))
    }

    fn set_entry(&self, db: DbIndex, key: &str) -> RefMut<'_, EntryKey, StoredEntry> {
        let entry_key = (db, key.to_string());
        self.data.remove_if(&entry_key, |_, entry| entry.is_expired());
        self.data
            .entry(entry_key)
            .or_insert_with(|| StoredEntry::new(StoredValue::Set(HashSet::new()), None))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get(&self, db: DbIndex, key: &str) -> Result<Option<Vec<u8>>> {
        self.check(db)?;
        match self.live(db, key) {
            Some(entry) => match &entry.value {
                StoredValue::Bytes(bytes) => Ok(Some(bytes.clone())),
                _ => Err(wrong_type()),
            },
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        db: DbIndex,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        self.check(db)?;
        let _guard = self.flush_lock.read();
        let ttl = ttl.filter(|d| !d.is_zero());
        self.data.insert(
            (db, key.to_string()),
            StoredEntry::new(StoredValue::Bytes(value), ttl),
        );
        Ok(true)
    }

    async fn delete(&self, db: DbIndex, key: &str) -> Result<bool> {
        self.check(db)?;
        let removed = self.data.remove(&(db, key.to_string()));
        Ok(matches!(removed, Some((_, entry)) if !entry.is_expired()))
    }

    async fn exists(&self, db: DbIndex, key: &str) -> Result<bool> {
        self.check(db)?;
        Ok(self.live(db, key).is_some())
    }

    async fn hash_set(&self, db: DbIndex, key: &str, field: &str, value: &str) -> Result<bool> {
        self.check(db)?;
        let _guard = self.flush_lock.read();
        let mut entry = self.hash_entry(db, key);
        match &mut entry.value {
            StoredValue::Hash(fields) => {
                Ok(fields.insert(field.to_string(), value.to_string()).is_none())
            }
            _ => Err(wrong_type()),
        }
    }

    async fn hash_get(&self, db: DbIndex, key: &str, field: &str) -> Result<Option<String>> {
        self.check(db)?;
        match self.live(db, key) {
            Some(entry) => match &entry.value {
                StoredValue::Hash(fields) => Ok(fields.get(field).cloned()),
                _ => Err(wrong_type()),
            },
            None => Ok(None),
        }
    }

    async fn hash_get_many(
        &self,
        db: DbIndex,
        key: &str,
        fields: &[&str],
    ) -> Result<Vec<Option<String>>> {
        self.check(db)?;
        match self.live(db, key) {
            Some(entry) => match &entry.value {
                StoredValue::Hash(stored) => {
                    Ok(fields.iter().map(|f| stored.get(*f).cloned()).collect())
                }
                _ => Err(wrong_type()),
            },
            None => Ok(vec![None; fields.len()]),
        }
    }

    async fn hash_delete(&self, db: DbIndex, key: &str, fields: &[&str]) -> Result<u64> {
        self.check(db)?;
        let removed = match self.live(db, key) {
            Some(mut entry) => match &mut entry.value {
                StoredValue::Hash(stored) => {
                    fields.iter().filter(|f| stored.remove(**f).is_some()).count() as u64
                }
                _ => return Err(wrong_type()),
            },
            None => 0,
        };
        self.prune(db, key);
        Ok(removed)
    }

    async fn hash_exists(&self, db: DbIndex, key: &str, field: &str) -> Result<bool> {
        self.check(db)?;
        match self.live(db, key) {
            Some(entry) => match &entry.value {
                StoredValue::Hash(fields) => Ok(fields.contains_key(field)),
                _ => Err(wrong_type()),
            },
            None => Ok(false),
        }
    }

    async fn set_add(&self, db: DbIndex, key: &str, members: &[&str]) -> Result<u64> {
        self.check(db)?;
        if members.is_empty() {
            return Ok(0);
        }
        let _guard = self.flush_lock.read();
        let mut entry = self.set_entry(db, key);
        match &mut entry.value {
            StoredValue::Set(stored) => Ok(members
                .iter()
                .filter(|m| stored.insert(m.to_string()))
                .count() as u64),
            _ => Err(wrong_type()),
        }
    }

    async fn set_remove(&self, db: DbIndex, key: &str, members: &[&str]) -> Result<u64> {
        self.check(db)?;
        let removed = match self.live(db, key) {
            Some(mut entry) => match &mut entry.value {
                StoredValue::Set(stored) => {
                    members.iter().filter(|m| stored.remove(**m)).count() as u64
                }
                _ => return Err(wrong_type()),
            },
            None => 0,
        };
        self.prune(db, key);
        Ok(removed)
    }

    async fn set_contains(&self, db: DbIndex, key: &str, member: &str) -> Result<bool> {
        self.check(db)?;
        match self.live(db, key) {
            Some(entry) => match &entry.value {
                StoredValue::Set(stored) => Ok(stored.contains(member)),
                _ => Err(wrong_type()),
            },
            None => Ok(false),
        }
    }

    async fn set_members(&self, db: DbIndex, key: &str) -> Result<HashSet<String>> {
        self.check(db)?;
        match self.live(db, key) {
            Some(entry) => match &entry.value {
                StoredValue::Set(stored) => Ok(stored.clone()),
                _ => Err(wrong_type()),
            },
            None => Ok(HashSet::new()),
        }
    }

    async fn flush_db(&self, db: DbIndex) -> Result<()> {
        self.check(db)?;
        let _guard = self.flush_lock.write();
        self.data.retain(|(entry_db, _), _| *entry_db != db);
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        self.check(0)?;
        let _guard = self.flush_lock.write();
        self.data.clear();
        Ok(())
    }

    async fn keys(&self, db: DbIndex, pattern: &str) -> Result<Vec<String>> {
        self.check(db)?;
        let _guard = self.flush_lock.read();
        let mut keys: Vec<String> = self
            .data
            .iter()
            .filter(|e| e.key().0 == db && !e.value().is_expired())
            .map(|e| e.key().1.clone())
            .filter(|k| glob_match(pattern, k))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Connector handing out handles to one shared `MemoryStore`
///
/// The target string is ignored; every connect returns a clone of the same
/// store.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
    connects: Arc<AtomicUsize>,
}

impl MemoryConnector {
    /// Create a connector over an existing store
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The shared store
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Number of successful `connect` calls so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Store = MemoryStore;

    async fn connect(&self, _target: &str) -> Result<MemoryStore> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_set_get_delete() {
        let store = MemoryStore::with_defaults();

        assert!(store.set(1, "k", b"v".to_vec(), None).await.unwrap());
        assert_eq!(store.get(1, "k").await.unwrap(), Some(b"v".to_vec()));
        assert!(store.exists(1, "k").await.unwrap());

        assert!(store.delete(1, "k").await.unwrap());
        assert!(!store.delete(1, "k").await.unwrap());
        assert_eq!(store.get(1, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_databases_are_isolated() {
        let store = MemoryStore::with_defaults();
        store.set(1, "k", b"one".to_vec(), None).await.unwrap();

        assert_eq!(store.get(0, "k").await.unwrap(), None);
        assert_eq!(store.get(1, "k").await.unwrap(), Some(b"one".to_vec()));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = MemoryStore::with_defaults();
        store
            .set(0, "short", b"v".to_vec(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(store.exists(0, "short").await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!store.exists(0, "short").await.unwrap());
        assert_eq!(store.get(0, "short").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_expires() {
        let store = MemoryStore::with_defaults();
        store
            .set(0, "k", b"v".to_vec(), Some(Duration::ZERO))
            .await
            .unwrap();
        assert!(store.exists(0, "k").await.unwrap());
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let store = MemoryStore::with_defaults();
        store
            .set(0, "k", b"v".to_vec(), Some(Duration::from_secs(u64::MAX)))
            .await
            .unwrap();
        assert!(store.exists(0, "k").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_ops() {
        let store = MemoryStore::with_defaults();

        assert!(store.hash_set(1, "h", "f1", "v1").await.unwrap());
        assert!(!store.hash_set(1, "h", "f1", "v1b").await.unwrap());
        store.hash_set(1, "h", "f2", "v2").await.unwrap();

        assert_eq!(
            store.hash_get(1, "h", "f1").await.unwrap().as_deref(),
            Some("v1b")
        );
        assert_eq!(
            store.hash_get_many(1, "h", &["f2", "nope", "f1"]).await.unwrap(),
            vec![Some("v2".to_string()), None, Some("v1b".to_string())]
        );
        assert!(store.hash_exists(1, "h", "f2").await.unwrap());

        assert_eq!(store.hash_delete(1, "h", &["f1", "f2", "nope"]).await.unwrap(), 2);
        assert!(!store.exists(1, "h").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_get_many_on_missing_key() {
        let store = MemoryStore::with_defaults();
        assert_eq!(
            store.hash_get_many(1, "missing", &["a", "b"]).await.unwrap(),
            vec![None, None]
        );
    }

    #[tokio::test]
    async fn test_set_ops() {
        let store = MemoryStore::with_defaults();

        assert_eq!(store.set_add(1, "s", &["a", "b", "a"]).await.unwrap(), 2);
        assert_eq!(store.set_add(1, "s", &["b", "c"]).await.unwrap(), 1);
        assert!(store.set_contains(1, "s", "c").await.unwrap());

        let members = store.set_members(1, "s").await.unwrap();
        assert_eq!(members.len(), 3);

        assert_eq!(store.set_remove(1, "s", &["a", "zzz"]).await.unwrap(), 1);
        assert_eq!(store.set_remove(1, "s", &["b", "c"]).await.unwrap(), 2);
        assert!(!store.exists(1, "s").await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let store = MemoryStore::with_defaults();
        store.set(1, "str", b"v".to_vec(), None).await.unwrap();

        let err = store.hash_set(1, "str", "f", "v").await.unwrap_err();
        assert_eq!(err.kind(), "backend");
        assert!(store.set_add(1, "str", &["a"]).await.is_err());
    }

    #[tokio::test]
    async fn test_flush_db_keeps_other_databases() {
        let store = MemoryStore::with_defaults();
        store.set(1, "a", b"1".to_vec(), None).await.unwrap();
        store.set(2, "b", b"2".to_vec(), None).await.unwrap();

        store.flush_db(1).await.unwrap();
        assert!(!store.exists(1, "a").await.unwrap());
        assert!(store.exists(2, "b").await.unwrap());

        store.flush_all().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_keys_pattern() {
        let store = MemoryStore::with_defaults();
        for key in ["Order_1", "Order_2", "Price_1"] {
            store.set(0, key, b"x".to_vec(), None).await.unwrap();
        }
        store.set(3, "Order_3", b"x".to_vec(), None).await.unwrap();

        assert_eq!(
            store.keys(0, "Order_*").await.unwrap(),
            vec!["Order_1".to_string(), "Order_2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_disconnected_and_out_of_range() {
        let store = MemoryStore::with_defaults();
        assert!(store.get(16, "k").await.is_err());

        store.set_connected(false);
        assert!(!store.is_connected());
        let err = store.get(0, "k").await.unwrap_err();
        assert!(err.is_connection());

        store.set_connected(true);
        assert!(store.get(0, "k").await.is_ok());
    }

    #[tokio::test]
    async fn test_connector_shares_store() {
        let connector = MemoryConnector::default();
        let a = connector.connect("ignored").await.unwrap();
        let b = connector.connect("ignored").await.unwrap();

        a.set(0, "k", b"v".to_vec(), None).await.unwrap();
        assert!(b.exists(0, "k").await.unwrap());
        assert_eq!(connector.connects(), 2);
    }
}
