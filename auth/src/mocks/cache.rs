//! Mock cache for testing.

use crate::error::{AuthError, Result};
use crate::providers::Cache;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

type Entries = HashMap<String, (String, Instant)>;

/// Mock cache.
///
/// In-memory map with per-key deadlines. Clones share state, so a test can
/// keep a handle to inspect or sabotage the cache a service is using.
#[derive(Debug, Clone, Default)]
pub struct MockCache {
    entries: Arc<Mutex<Entries>>,
    unavailable: Arc<AtomicBool>,
}

fn lock_failed() -> AuthError {
    AuthError::Internal("Mutex lock failed".to_string())
}

impl MockCache {
    /// Create an empty mock cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `ServiceUnavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Drop `key` as if its TTL had elapsed.
    pub fn expire(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Remaining TTL of `key`.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .and_then(|(_, deadline)| deadline.checked_duration_since(now))
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|(_, deadline)| *deadline > now)
            .count()
    }

    /// Whether no live keys remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(unavailable: &AtomicBool) -> Result<()> {
        if unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::ServiceUnavailable("mock cache offline".to_string()));
        }
        Ok(())
    }
}

/// Remove `key` if its deadline has passed, returning the live value.
fn live<'a>(entries: &'a mut Entries, key: &str) -> Option<&'a String> {
    let now = Instant::now();
    if entries.get(key).is_some_and(|(_, deadline)| *deadline <= now) {
        entries.remove(key);
    }
    entries.get(key).map(|(value, _)| value)
}

impl Cache for MockCache {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> impl Future<Output = Result<()>> + Send {
        let entries = Arc::clone(&self.entries);
        let unavailable = Arc::clone(&self.unavailable);
        let key = key.to_string();
        let value = value.to_string();

        async move {
            Self::check_available(&unavailable)?;
            let mut guard = entries.lock().map_err(|_| lock_failed())?;
            guard.insert(key, (value, Instant::now() + ttl));
            Ok(())
        }
    }

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let entries = Arc::clone(&self.entries);
        let unavailable = Arc::clone(&self.unavailable);
        let key = key.to_string();

        async move {
            Self::check_available(&unavailable)?;
            let mut guard = entries.lock().map_err(|_| lock_failed())?;
            Ok(live(&mut guard, &key).cloned())
        }
    }

    fn delete(&self, keys: &[String]) -> impl Future<Output = Result<usize>> + Send {
        let entries = Arc::clone(&self.entries);
        let unavailable = Arc::clone(&self.unavailable);
        let keys = keys.to_vec();

        async move {
            Self::check_available(&unavailable)?;
            let mut guard = entries.lock().map_err(|_| lock_failed())?;
            let mut deleted = 0;
            for key in &keys {
                if live(&mut guard, key).is_some() {
                    guard.remove(key);
                    deleted += 1;
                }
            }
            Ok(deleted)
        }
    }

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        let entries = Arc::clone(&self.entries);
        let unavailable = Arc::clone(&self.unavailable);
        let key = key.to_string();

        async move {
            Self::check_available(&unavailable)?;
            let mut guard = entries.lock().map_err(|_| lock_failed())?;
            Ok(live(&mut guard, &key).is_some())
        }
    }
}
