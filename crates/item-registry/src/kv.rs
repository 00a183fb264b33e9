//! Key-value backends for the item store
//!
//! The registry only needs get/set/delete on string keys holding JSON
//! strings. Redis is the production backend; [`MemoryKv`] backs tests and
//! local development.

use async_trait::async_trait;
use lostfound_common::{Error, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Minimal key-value API the item store is written against
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Returns true if it existed.
    async fn del(&self, key: &str) -> Result<bool>;

    /// Short backend label for health output
    fn backend_name(&self) -> &'static str;
}

/// Redis-backed key-value store
pub struct RedisKv {
    conn: ConnectionManager,
}

impl RedisKv {
    /// Connect to Redis
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Storage(format!("Failed to create Redis client: {}", e)))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Storage(format!("Failed to connect to Redis: {}", e)))?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set(key, value)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(key)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(removed > 0)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Operation kinds for [`MemoryKv`] failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvOp {
    Get,
    Set,
    Del,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    op: KvOp,
    key: Option<String>,
    message: String,
}

/// In-memory key-value store
///
/// Failures can be injected per operation (optionally per key) to exercise
/// storage error paths.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
    failures: RwLock<Vec<InjectedFailure>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `op` fail with `message`
    pub async fn fail_on(&self, op: KvOp, message: impl Into<String>) {
        self.failures.write().await.push(InjectedFailure {
            op,
            key: None,
            message: message.into(),
        });
    }

    /// Make `op` fail with `message`, but only for `key`
    pub async fn fail_on_key(&self, op: KvOp, key: impl Into<String>, message: impl Into<String>) {
        self.failures.write().await.push(InjectedFailure {
            op,
            key: Some(key.into()),
            message: message.into(),
        });
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Number of keys currently stored
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn check(&self, op: KvOp, key: &str) -> Result<()> {
        let failures = self.failures.read().await;
        let hit = failures
            .iter()
            .find(|f| f.op == op && f.key.as_deref().map_or(true, |k| k == key));

        match hit {
            Some(f) => Err(Error::Storage(f.message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check(KvOp::Get, key).await?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check(KvOp::Set, key).await?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        self.check(KvOp::Del, key).await?;
        Ok(self.entries.write().await.remove(key).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
