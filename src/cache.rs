//! Flat string-keyed cache used to memoize identifiers assigned by the
//! assistant service.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {reason}")]
    Connection { reason: String },
    #[error("Cache query error: {reason}")]
    Query { reason: String },
}

#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Missing keys are `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Overwrites any prior value. No expiry.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Keys matching a glob-style pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    async fn close(&self);
}

pub struct RedisCache {
    url: String,
    connection: Mutex<Option<ConnectionManager>>,
}

impl RedisCache {
    /// Does not touch the network; call [`RedisCache::connect`] before use.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection: Mutex::new(None),
        }
    }

    /// Opens the connection. Repeated calls reuse the existing one.
    pub async fn connect(&self) -> Result<(), CacheError> {
        let mut slot = self.connection.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        let client = redis::Client::open(self.url.as_str()).map_err(|e| CacheError::Connection {
            reason: e.to_string(),
        })?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Connection {
                reason: e.to_string(),
            })?;

        info!("Connected successfully to Redis");
        *slot = Some(manager);
        Ok(())
    }

    async fn handle(&self) -> Result<ConnectionManager, CacheError> {
        self.connection
            .lock()
            .await
            .clone()
            .ok_or_else(|| CacheError::Connection {
                reason: "not connected".to_string(),
            })
    }
}

fn query_error(e: redis::RedisError) -> CacheError {
    CacheError::Query {
        reason: e.to_string(),
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.handle().await?;
        conn.get(key).await.map_err(query_error)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.handle().await?;
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(query_error)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.handle().await?;
        conn.del::<_, ()>(key).await.map_err(query_error)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.handle().await?;
        conn.keys(pattern).await.map_err(query_error)
    }

    async fn close(&self) {
        if self.connection.lock().await.take().is_some() {
            info!("Closed Redis connection");
        } else {
            warn!("Redis connection already closed");
        }
    }
}

/// In-process cache with the same contract as [`RedisCache`].
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .await
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn close(&self) {}
}

// `*` only; enough for prefix listings.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return candidate.is_empty();
    };
    let Some(mut rest) = candidate.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
