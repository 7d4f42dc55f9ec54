//! Cache-backed session entries.
//!
//! Each issued credential pair records two entries, `auth:session:{id}` →
//! public user id, one per session id, with TTL equal to the token's remaining
//! lifetime. The cache is the authority on whether a session is still live:
//! once an entry is gone (expired or revoked) the token is rejected even if
//! its own `exp` has not passed.

use crate::constants::keys;
use crate::credentials::remaining;
use crate::error::{AuthError, Result};
use crate::providers::Cache;
use crate::state::{CredentialPair, PublicUserId, SessionId};
use chrono::Utc;

fn session_key(id: &SessionId) -> String {
    format!("{}{id}", keys::SESSION)
}

/// Session entries over a [`Cache`].
#[derive(Clone)]
pub struct CredentialCache<C> {
    cache: C,
}

impl<C: Cache> CredentialCache<C> {
    /// Wrap a cache.
    #[must_use]
    pub const fn new(cache: C) -> Self {
        Self { cache }
    }

    /// Record both sessions of `pair`.
    ///
    /// # Errors
    ///
    /// Fails if either write fails. Nothing is rolled back; the caller treats
    /// the whole sign-in as failed.
    pub async fn cache(&self, pair: &CredentialPair, public_id: PublicUserId) -> Result<()> {
        let now = Utc::now();
        let value = public_id.to_string();

        self.cache
            .set(
                &session_key(&pair.access_session_id),
                &value,
                remaining(pair.access_expires_at, now),
            )
            .await?;
        self.cache
            .set(
                &session_key(&pair.refresh_session_id),
                &value,
                remaining(pair.refresh_expires_at, now),
            )
            .await?;

        Ok(())
    }

    /// Delete `ids` in one call.
    ///
    /// # Errors
    ///
    /// - `AlreadyExpired` if any id was already absent (the others are still deleted)
    /// - `ServiceUnavailable` if the cache is unreachable
    pub async fn revoke(&self, ids: &[SessionId]) -> Result<()> {
        let keys: Vec<String> = ids.iter().map(session_key).collect();
        let deleted = self.cache.delete(&keys).await?;

        if deleted < keys.len() {
            tracing::warn!(requested = keys.len(), deleted, "Revoked session already expired");
            return Err(AuthError::AlreadyExpired);
        }

        Ok(())
    }

    /// Whether session `id` is live.
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` if the cache is unreachable.
    pub async fn exists(&self, id: &SessionId) -> Result<bool> {
        self.cache.exists(&session_key(id)).await
    }

    /// Public user id recorded for session `id`, if live.
    ///
    /// # Errors
    ///
    /// - `ServiceUnavailable` if the cache is unreachable
    /// - `Internal` if the stored value is not a public user id
    pub async fn lookup(&self, id: &SessionId) -> Result<Option<PublicUserId>> {
        self.cache
            .get(&session_key(id))
            .await?
            .map(|value| value.parse::<PublicUserId>())
            .transpose()
    }
}
