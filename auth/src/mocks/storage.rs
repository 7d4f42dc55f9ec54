//! Mock object storage for testing.

use crate::error::{AuthError, Result};
use crate::providers::StorageProvider;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock storage provider.
///
/// Returns deterministic fake URLs of the form
/// `https://storage.test/{bucket}/{object}?expires={seconds}`.
#[derive(Debug, Clone, Default)]
pub struct MockStorageProvider {
    failing: Arc<AtomicBool>,
}

impl MockStorageProvider {
    /// Create a mock storage provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make presigning fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl StorageProvider for MockStorageProvider {
    fn presigned_put_url(
        &self,
        bucket: &str,
        object: &str,
        expires_in: Duration,
    ) -> impl Future<Output = Result<String>> + Send {
        let failing = self.failing.load(Ordering::SeqCst);
        let url = format!(
            "https://storage.test/{bucket}/{object}?expires={}",
            expires_in.as_secs()
        );

        async move {
            if failing {
                return Err(AuthError::ServiceUnavailable("mock storage offline".to_string()));
            }
            Ok(url)
        }
    }
}
