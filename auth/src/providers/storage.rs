//! Object storage trait.

use crate::error::Result;
use std::time::Duration;

/// Presigned-URL issuer for an S3-compatible object store.
pub trait StorageProvider: Send + Sync {
    /// URL the client can `PUT` `object` to in `bucket`, valid for `expires_in`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ServiceUnavailable` if the store cannot sign the request.
    fn presigned_put_url(
        &self,
        bucket: &str,
        object: &str,
        expires_in: Duration,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
