//! Volatile cache capability and the in-process backend.
//!
//! The cache is never authoritative. Callers treat every error as a miss (on
//! read) or log and continue (on write).

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache payload could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("key `{key}` holds a value of the wrong type")]
    WrongType { key: String },
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key/value and hash primitives the cache components rely on.
///
/// Every operation is individually atomic; nothing spans more than one call.
#[async_trait]
pub trait VolatileCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remove keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Every live key starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// All fields of a hash; empty when the key is absent.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, CacheError>;

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), CacheError>;

    /// Set a field only when it is not present yet. Returns whether it was written.
    async fn hash_set_if_absent(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, CacheError>;

    /// Reset the lifetime of a key. Returns false when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

/// In-process backend with per-key expiry and a bounded key count.
///
/// Expired entries are dropped lazily; once `capacity` keys are held the least
/// recently used one is evicted.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, Entry>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_capacity(super::config::default_memory_capacity())
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        rw_read(&self.entries, SOURCE, "capacity").cap().get()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        rw_read(&self.entries, SOURCE, "len")
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_entry(entries: &mut LruCache<String, Entry>, key: &str, now: Instant) -> Option<Entry> {
        match entries.peek(key) {
            Some(entry) if entry.is_live(now) => Some(entry.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VolatileCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                Value::Text(text) => Ok(Some(text.clone())),
                Value::Hash(_) => Err(CacheError::WrongType {
                    key: key.to_string(),
                }),
            },
            _ => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "set_ex").put(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "delete");
        let mut removed = 0;
        for key in keys {
            if let Some(entry) = entries.pop(key.as_str())
                && entry.is_live(now)
            {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let entries = rw_read(&self.entries, SOURCE, "scan_prefix");
        Ok(entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        Ok(rw_read(&self.entries, SOURCE, "exists")
            .peek(key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "hash_get_all");
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                Value::Hash(fields) => Ok(fields.clone()),
                Value::Text(_) => Err(CacheError::WrongType {
                    key: key.to_string(),
                }),
            },
            _ => Ok(HashMap::new()),
        }
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "hash_set");
        let mut entry = Self::live_entry(&mut entries, key, now).unwrap_or(Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        let Value::Hash(map) = &mut entry.value else {
            return Err(CacheError::WrongType {
                key: key.to_string(),
            });
        };
        for (field, value) in fields {
            map.insert(field.clone(), value.clone());
        }
        entries.put(key.to_string(), entry);
        Ok(())
    }

    async fn hash_set_if_absent(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "hash_set_if_absent");
        let mut entry = Self::live_entry(&mut entries, key, now).unwrap_or(Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        let Value::Hash(map) = &mut entry.value else {
            return Err(CacheError::WrongType {
                key: key.to_string(),
            });
        };
        if map.contains_key(field) {
            return Ok(false);
        }
        map.insert(field.to_string(), value.to_string());
        entries.put(key.to_string(), entry);
        Ok(true)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "expire");
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            Some(_) => {
                entries.pop(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
