//! Console email provider for development.

use crate::error::Result;
use crate::providers::EmailProvider;
use tracing::info;

/// Console email provider.
///
/// Logs emails instead of sending them. Useful for local development where
/// the verification link should be clickable straight from the terminal.
///
/// # Examples
///
/// ```ignore
/// use orchid_auth::providers::ConsoleEmailProvider;
///
/// let provider = ConsoleEmailProvider::new();
/// provider.send("user@example.com", "Sign in", "<a href=\"...\">Sign in</a>").await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailProvider;

impl ConsoleEmailProvider {
    /// Create a new console email provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// First `href` target in an HTML body.
fn first_link(html_body: &str) -> Option<&str> {
    let start = html_body.find("href=\"")? + "href=\"".len();
    let len = html_body[start..].find('"')?;
    Some(&html_body[start..start + len])
}

impl EmailProvider for ConsoleEmailProvider {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let link = first_link(html_body).unwrap_or("-");

        info!(
            to = %to,
            subject = %subject,
            link = %link,
            body_bytes = html_body.len(),
            "Email (development mode, not sent)"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_link() {
        let body = r#"<p><a href="https://x.test/m/callback?token=abc">go</a></p>"#;
        assert_eq!(first_link(body), Some("https://x.test/m/callback?token=abc"));
        assert_eq!(first_link("<p>no links</p>"), None);
    }

    #[tokio::test]
    async fn test_send_always_succeeds() {
        let provider = ConsoleEmailProvider::new();
        assert!(provider.send("a@example.com", "Hi", "<p>hi</p>").await.is_ok());
    }
}
