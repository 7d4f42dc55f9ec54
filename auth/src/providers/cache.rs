//! Key-value cache trait.
//!
//! One capability interface for every piece of short-lived state: verification
//! codes and session entries. The underlying store can be swapped without
//! touching session logic.

use crate::error::Result;
use std::time::Duration;

/// Key-value cache with per-key TTL.
///
/// # Implementation Notes
///
/// - Every operation is a single-key atomic command on the backing store;
///   callers build their race handling on the count returned by `delete`
/// - An unreachable or slow backend is reported as
///   [`AuthError::ServiceUnavailable`](crate::AuthError::ServiceUnavailable),
///   never as a missing key
/// - Implementations must bound each call so a hung backend cannot stall a
///   request indefinitely
pub trait Cache: Send + Sync {
    /// Set `key` to `value`, expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Value of `key`, or `None` if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Delete `keys`, returning how many existed.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    fn delete(&self, keys: &[String]) -> impl std::future::Future<Output = Result<usize>> + Send;

    /// Whether `key` is present and unexpired.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    fn exists(&self, key: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}
