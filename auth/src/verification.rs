//! Single-use email verification codes.
//!
//! Each live code occupies two cache entries with the same TTL:
//!
//! - `auth:verification_code:{code}` → `"{operation}:{email}"`, consumed at sign-in
//! - `auth:verification_email:{email}` → `code`, used to evict a stale code
//!   before issuing a new one
//!
//! # Security
//!
//! - **Single-use**: the code entry is deleted before the caller acts on it.
//!   When two requests race on one code, the cache's delete count decides the
//!   winner and the loser sees `CodeExpired`.
//! - **One live code per email**: issuing evicts the previous code first.
//! - **Cheap rejection**: wrong-shape codes never reach the cache.

use crate::config::VerificationConfig;
use crate::constants::keys;
use crate::constants::verification::{CODE_LENGTH, VALUE_SEPARATOR};
use crate::error::{AuthError, Result};
use crate::providers::{Cache, EmailProvider};
use crate::state::Operation;
use crate::templates::compose_email;
use crate::utils::random_code;
use constant_time_eq::constant_time_eq;
use std::time::Duration;

fn code_key(code: &str) -> String {
    format!("{}{code}", keys::VERIFICATION_CODE)
}

fn email_key(email: &str) -> String {
    format!("{}{email}", keys::VERIFICATION_EMAIL)
}

/// Whether `code` has the shape of an issued code.
#[must_use]
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Issues and consumes verification codes.
#[derive(Clone)]
pub struct VerificationCodeStore<C, E> {
    cache: C,
    email: E,
    config: VerificationConfig,
}

impl<C, E> VerificationCodeStore<C, E>
where
    C: Cache,
    E: EmailProvider,
{
    /// Create a code store.
    #[must_use]
    pub const fn new(cache: C, email: E, config: VerificationConfig) -> Self {
        Self {
            cache,
            email,
            config,
        }
    }

    fn code_ttl(&self) -> Result<Duration> {
        self.config
            .code_ttl
            .to_std()
            .map_err(|e| AuthError::Internal(format!("invalid code TTL: {e}")))
    }

    /// Issue a fresh code for `email` and mail it.
    ///
    /// `email` must already be normalized. Any code previously issued for the
    /// same address stops working.
    ///
    /// # Errors
    ///
    /// - `ServiceUnavailable` if the cache is unreachable or the email could
    ///   not be sent. In the latter case the code stays cached; a new request
    ///   evicts and reissues it.
    pub async fn issue_code(&self, email: &str, operation: Operation) -> Result<String> {
        let ttl = self.code_ttl()?;
        let email_key = email_key(email);

        if let Some(previous) = self.cache.get(&email_key).await? {
            let evicted = self.cache.delete(&[code_key(&previous)]).await?;
            tracing::debug!(evicted, "Evicted previous verification code");
        }

        let code = random_code();
        let value = format!("{}{VALUE_SEPARATOR}{email}", operation.as_str());

        self.cache.set(&code_key(&code), &value, ttl).await?;
        self.cache.set(&email_key, &code, ttl).await?;

        let (subject, body) = compose_email(&self.config, &code, operation);
        self.email
            .send(email, subject, &body)
            .await
            .map_err(|e| match e {
                AuthError::ServiceUnavailable(_) => e,
                other => AuthError::ServiceUnavailable(other.to_string()),
            })?;

        tracing::info!(operation = %operation, "Verification code issued");

        Ok(code)
    }

    /// Consume `code`, returning the operation and email it was issued for.
    ///
    /// # Errors
    ///
    /// - `InvalidVerificationCode` if the code has the wrong shape (no cache access)
    /// - `CodeExpired` if the code is absent or another request consumed it first
    /// - `ServiceUnavailable` if the cache is unreachable
    /// - `Internal` if the stored value is corrupt
    pub async fn consume_code(&self, code: &str) -> Result<(Operation, String)> {
        if !is_well_formed_code(code) {
            return Err(AuthError::InvalidVerificationCode);
        }

        let key = code_key(code);
        let value = self.cache.get(&key).await?.ok_or(AuthError::CodeExpired)?;

        if self.cache.delete(&[key]).await? == 0 {
            tracing::warn!("Verification code consumed concurrently");
            return Err(AuthError::CodeExpired);
        }

        let (operation, email) = value
            .split_once(VALUE_SEPARATOR)
            .ok_or_else(|| AuthError::Internal("corrupt verification code entry".to_string()))?;
        let operation = operation
            .parse::<Operation>()
            .map_err(|_| AuthError::Internal(format!("corrupt verification operation {operation:?}")))?;

        self.release_email(email, code).await;

        Ok((operation, email.to_string()))
    }

    /// Drop the email pointer if it still names `code`.
    async fn release_email(&self, email: &str, code: &str) {
        let key = email_key(email);
        let outcome = match self.cache.get(&key).await {
            Ok(Some(current)) if constant_time_eq(current.as_bytes(), code.as_bytes()) => {
                self.cache.delete(&[key]).await.map(|_| ())
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            // The code itself is gone; the pointer expires with its TTL.
            tracing::warn!(error = %e, "Failed to release verification email entry");
        }
    }
}
