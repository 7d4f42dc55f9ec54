//! Mock email provider for testing.

use crate::error::{AuthError, Result};
use crate::providers::EmailProvider;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// An email captured by [`MockEmailProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Recipient.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub body: String,
}

impl SentEmail {
    /// Verification code embedded in the callback link, if any.
    #[must_use]
    pub fn code(&self) -> Option<String> {
        let start = self.body.find("token=")? + "token=".len();
        let code: String = self.body[start..]
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect();
        (!code.is_empty()).then_some(code)
    }

    /// Operation named in the callback link, if any.
    #[must_use]
    pub fn operation(&self) -> Option<String> {
        let start = self.body.find("operation=")? + "operation=".len();
        let operation: String = self.body[start..]
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect();
        (!operation.is_empty()).then_some(operation)
    }
}

/// Mock email provider.
///
/// Records every message instead of delivering it. Clones share the outbox.
#[derive(Debug, Clone, Default)]
pub struct MockEmailProvider {
    outbox: Arc<Mutex<Vec<SentEmail>>>,
    failing: Arc<AtomicBool>,
}

impl MockEmailProvider {
    /// Create a mock email provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends fail with `ServiceUnavailable` until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All recorded emails, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent email sent to `to`.
    #[must_use]
    pub fn last_to(&self, to: &str) -> Option<SentEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|email| email.to == to)
            .cloned()
    }

    /// Code from the most recent email sent to `to`.
    #[must_use]
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.last_to(to).and_then(|email| email.code())
    }
}

impl EmailProvider for MockEmailProvider {
    fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        let outbox = Arc::clone(&self.outbox);
        let failing = self.failing.load(Ordering::SeqCst);
        let email = SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        };

        async move {
            if failing {
                return Err(AuthError::ServiceUnavailable("mock mailer offline".to_string()));
            }
            outbox
                .lock()
                .map_err(|_| AuthError::Internal("Mutex lock failed".to_string()))?
                .push(email);
            Ok(())
        }
    }
}
