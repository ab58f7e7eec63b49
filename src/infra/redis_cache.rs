//! Redis backend for the volatile cache.
//!
//! One multiplexed `ConnectionManager` is shared by every request; it
//! reconnects on its own after a dropped connection.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::{
    Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::info;

use crate::cache::{CacheError, VolatileCache};

use super::error::InfraError;

const CONNECT_RETRIES: usize = 1;
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const SCAN_BATCH: usize = 200;

#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, InfraError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(CONNECT_RETRIES)
            .set_connection_timeout(CONNECT_TIMEOUT);

        let client = Client::open(redis_url)
            .map_err(|err| InfraError::cache(format!("invalid redis url: {err}")))?;
        let connection = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(|err| InfraError::cache(format!("failed to connect to redis: {err}")))?;

        info!("connected to redis");
        Ok(Self { connection })
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

/// Quote glob metacharacters so `SCAN MATCH` treats the prefix literally.
fn glob_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('*');
    pattern
}

fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl VolatileCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut self.conn())
            .await
            .map_err(CacheError::backend)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds(ttl))
            .query_async::<()>(&mut self.conn())
            .await
            .map_err(CacheError::backend)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        redis::cmd("DEL")
            .arg(keys)
            .query_async::<u64>(&mut self.conn())
            .await
            .map_err(CacheError::backend)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let pattern = glob_prefix(prefix);
        let mut conn = self.conn();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async::<(u64, Vec<String>)>(&mut conn)
                .await
                .map_err(CacheError::backend)?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once across iterations.
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        redis::cmd("EXISTS")
            .arg(key)
            .query_async::<bool>(&mut self.conn())
            .await
            .map_err(CacheError::backend)
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        redis::cmd("HGETALL")
            .arg(key)
            .query_async::<HashMap<String, String>>(&mut self.conn())
            .await
            .map_err(CacheError::backend)
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), CacheError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        cmd.query_async::<()>(&mut self.conn())
            .await
            .map_err(CacheError::backend)
    }

    async fn hash_set_if_absent(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, CacheError> {
        redis::cmd("HSETNX")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async::<bool>(&mut self.conn())
            .await
            .map_err(CacheError::backend)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_seconds(ttl))
            .query_async::<bool>(&mut self.conn())
            .await
            .map_err(CacheError::backend)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        redis::cmd("PING")
            .query_async::<String>(&mut self.conn())
            .await
            .map(|_| ())
            .map_err(CacheError::backend)
    }
}
