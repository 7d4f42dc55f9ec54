//! Redis-based cache implementation.
//!
//! Stores verification codes and session entries as plain string values with
//! Redis-side TTLs:
//!
//! - `SET key value EX ttl` for writes (atomic set + expire)
//! - `DEL k1 k2 ...` returning the number of keys that existed, which callers
//!   use to detect revocation and consumption races
//!
//! Every command is bounded by an operation timeout. A timeout or connection
//! failure surfaces as `ServiceUnavailable`, never as a missing key.
//!
//! # Example
//!
//! ```no_run
//! use orchid_auth::stores::RedisCache;
//! use orchid_auth::providers::Cache;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RedisCache::new("redis://127.0.0.1:6379").await?;
//!
//! cache.set("auth:session:abc", "117653972", Duration::from_secs(900)).await?;
//! assert!(cache.exists("auth:session:abc").await?);
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::Cache;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisResult};
use std::future::Future;
use std::time::Duration;

/// Default bound on a single Redis command.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

/// `Redis`-backed [`Cache`].
///
/// # Thread Safety
///
/// This type is `Clone` and can be safely shared across tasks.
/// Each clone shares the same `ConnectionManager`.
#[derive(Clone)]
pub struct RedisCache {
    /// Connection manager (multiplexed, auto-reconnecting).
    conn_manager: ConnectionManager,

    /// Upper bound on each command.
    operation_timeout: Duration,
}

impl RedisCache {
    /// Connect to `Redis`.
    ///
    /// # Connection URL Format
    ///
    /// - TCP: `redis://[:password@]host[:port][/database]`
    /// - TLS: `rediss://[:password@]host[:port][/database]`
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` if the URL is malformed or the server
    /// cannot be reached.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            AuthError::ServiceUnavailable(format!("failed to create Redis client: {e}"))
        })?;

        let conn_manager = tokio::time::timeout(
            DEFAULT_OPERATION_TIMEOUT,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| AuthError::ServiceUnavailable("timed out connecting to Redis".to_string()))?
        .map_err(|e| {
            AuthError::ServiceUnavailable(format!("failed to connect to Redis: {e}"))
        })?;

        tracing::info!("RedisCache initialized");

        Ok(Self {
            conn_manager,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        })
    }

    /// Set the per-command timeout.
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Run one command under the operation timeout.
    async fn bounded<T, F>(&self, command: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>> + Send,
        T: Send,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!(command, error = %e, "Redis command failed");
                Err(AuthError::ServiceUnavailable(format!("redis {command} failed: {e}")))
            }
            Err(_) => {
                tracing::error!(command, timeout = ?self.operation_timeout, "Redis command timed out");
                Err(AuthError::ServiceUnavailable(format!("redis {command} timed out")))
            }
        }
    }
}

impl Cache for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        self.bounded("SET", conn.set_ex::<_, _, ()>(key, value, ttl_seconds))
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();

        self.bounded("GET", conn.get::<_, Option<String>>(key)).await
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn_manager.clone();

        self.bounded("DEL", conn.del::<_, usize>(keys.to_vec())).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn_manager.clone();

        self.bounded("EXISTS", conn.exists::<_, bool>(key)).await
    }
}
