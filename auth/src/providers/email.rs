//! Email provider trait.

use crate::error::Result;

/// Email provider.
///
/// This trait abstracts over email delivery (SMTP relay, SES, Postmark, ...).
/// Rendering happens before the call; providers only deliver.
pub trait EmailProvider: Send + Sync {
    /// Send an HTML email.
    ///
    /// # Arguments
    ///
    /// - `to`: Recipient email address
    /// - `subject`: Subject line
    /// - `html_body`: Rendered HTML body
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ServiceUnavailable` if:
    /// - Network request fails
    /// - Email provider rejects the message
    fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
