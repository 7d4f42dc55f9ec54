//! SMTP email provider implementation using Lettre.

use crate::error::{AuthError, Result};
use crate::providers::EmailProvider;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// SMTP email provider using Lettre.
///
/// Sends real emails through an authenticated SMTP relay (STARTTLS).
///
/// # Examples
///
/// ```ignore
/// use orchid_auth::providers::SmtpEmailProvider;
///
/// let provider = SmtpEmailProvider::new(
///     "smtp.example.com",
///     587,
///     "mailer",
///     "app_password",
///     "noreply@example.com",
///     "Orchid",
/// )?;
/// ```
#[derive(Clone)]
pub struct SmtpEmailProvider {
    /// SMTP server address.
    smtp_server: String,

    /// SMTP server port.
    smtp_port: u16,

    /// SMTP credentials.
    credentials: Credentials,

    /// Parsed sender mailbox.
    from: Mailbox,
}

impl SmtpEmailProvider {
    /// Create a new SMTP email provider.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the sender address does not parse.
    pub fn new(
        smtp_server: impl Into<String>,
        smtp_port: u16,
        smtp_username: impl Into<String>,
        smtp_password: impl Into<String>,
        from_email: &str,
        from_name: &str,
    ) -> Result<Self> {
        let from = format!("{from_name} <{from_email}>")
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Internal(format!("invalid sender address: {e}")))?;

        Ok(Self {
            smtp_server: smtp_server.into(),
            smtp_port,
            credentials: Credentials::new(smtp_username.into(), smtp_password.into()),
            from,
        })
    }

    /// Sender mailbox.
    #[must_use]
    pub const fn from_mailbox(&self) -> &Mailbox {
        &self.from
    }

    /// Build the message for `to`.
    fn build_message(&self, to: &str, subject: &str, html_body: &str) -> Result<Message> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| AuthError::ServiceUnavailable(format!("invalid recipient: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AuthError::Internal(format!("failed to build email: {e}")))
    }

    /// Build SMTP transport. A fresh transport per email avoids stale pooled connections.
    fn build_transport(&self) -> Result<SmtpTransport> {
        let transport = SmtpTransport::starttls_relay(&self.smtp_server)
            .map_err(|e| AuthError::ServiceUnavailable(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build();
        Ok(transport)
    }
}

impl EmailProvider for SmtpEmailProvider {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let email = self.build_message(to, subject, html_body)?;
        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| AuthError::ServiceUnavailable(format!("failed to send email: {e}")))
        })
        .await
        .map_err(|e| AuthError::Internal(format!("email task failed: {e}")))??;

        tracing::debug!(to = %to, subject = %subject, "Email delivered to SMTP relay");

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn provider() -> SmtpEmailProvider {
        SmtpEmailProvider::new(
            "smtp.example.com",
            587,
            "mailer",
            "secret",
            "noreply@example.com",
            "Orchid",
        )
        .unwrap()
    }

    #[test]
    fn test_sender_mailbox() {
        let provider = provider();
        assert_eq!(provider.from_mailbox().email.to_string(), "noreply@example.com");
        assert_eq!(provider.from_mailbox().name.as_deref(), Some("Orchid"));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let result = SmtpEmailProvider::new("smtp.example.com", 587, "u", "p", "not an address", "X");
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_message_builds_for_valid_recipient() {
        let message = provider()
            .build_message("a@example.com", "Sign in", "<p>hi</p>")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Sign in"));
        assert!(raw.contains("To: a@example.com"));
    }

    #[test]
    fn test_invalid_recipient_is_unavailable() {
        let result = provider().build_message("nope", "Sign in", "<p>hi</p>");
        assert!(matches!(result, Err(AuthError::ServiceUnavailable(_))));
    }
}
