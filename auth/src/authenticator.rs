//! Bearer-token authentication.
//!
//! A request moves through
//! `NoToken → TokenParsed → TokenVerified → SessionConfirmed → IdentityInjected`;
//! [`Authenticator::authenticate`] performs every transition up to the last
//! and stops at the first failure. The HTTP middleware injects the result.

use crate::constants::credentials::BEARER_SCHEME;
use crate::credentials::CredentialFactory;
use crate::error::{AuthError, Result};
use crate::providers::Cache;
use crate::sessions::CredentialCache;
use crate::state::{Identity, PublicUserId, SessionId};

/// Token from an `Authorization: Bearer <token>` header value.
///
/// # Errors
///
/// Returns `Unauthorized` if the header is absent or not a bearer credential.
///
/// # Examples
///
/// ```
/// use orchid_auth::authenticator::bearer_token;
///
/// assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).ok(), Some("abc.def.ghi"));
/// assert!(bearer_token(Some("Basic dXNlcg==")).is_err());
/// assert!(bearer_token(None).is_err());
/// ```
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let (scheme, token) = header
        .and_then(|value| value.split_once(' '))
        .ok_or(AuthError::Unauthorized)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME)
        || token.is_empty()
        || token.contains(char::is_whitespace)
    {
        return Err(AuthError::Unauthorized);
    }

    Ok(token)
}

/// Verifies access tokens against signature, expiry and the session cache.
#[derive(Clone)]
pub struct Authenticator<C> {
    credentials: CredentialFactory,
    sessions: CredentialCache<C>,
}

impl<C: Cache> Authenticator<C> {
    /// Create an authenticator.
    #[must_use]
    pub const fn new(credentials: CredentialFactory, sessions: CredentialCache<C>) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    /// Resolve the caller behind an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: no bearer token, expired token, or session no longer cached
    /// - `InvalidToken`: bad signature, wrong algorithm, malformed claims
    /// - `ServiceUnavailable`: cache unreachable
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Identity> {
        let token = bearer_token(header)?;

        let claims = self.credentials.verify_access(token).inspect_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
        })?;

        let session_id = SessionId::from(claims.access_uuid);
        let public_id = PublicUserId(claims.user_id);

        match self.sessions.lookup(&session_id).await? {
            Some(cached) if cached == public_id => Ok(Identity {
                public_id,
                session_id,
            }),
            Some(cached) => {
                tracing::warn!(
                    token_user = %public_id,
                    session_user = %cached,
                    "Session belongs to another user"
                );
                Err(AuthError::InvalidToken)
            }
            None => {
                tracing::debug!(session_id = %session_id, "Session not live");
                Err(AuthError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CredentialConfig;
    use crate::mocks::MockCache;

    fn authenticator() -> (Authenticator<MockCache>, CredentialFactory, CredentialCache<MockCache>) {
        let factory = CredentialFactory::new(CredentialConfig::new("a-secret", "r-secret"));
        let sessions = CredentialCache::new(MockCache::new());
        (
            Authenticator::new(factory.clone(), sessions.clone()),
            factory,
            sessions,
        )
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer_token(Some("bearer tok")).unwrap(), "tok");
        assert!(bearer_token(Some("Bearer")).is_err());
        assert!(bearer_token(Some("Bearer ")).is_err());
        assert!(bearer_token(Some("Bearer a b")).is_err());
        assert!(bearer_token(Some("tok")).is_err());
    }

    #[tokio::test]
    async fn test_live_session_yields_identity() {
        let (auth, factory, sessions) = authenticator();
        let pair = factory.create_credentials(PublicUserId(99)).unwrap();
        sessions.cache(&pair, PublicUserId(99)).await.unwrap();

        let header = format!("Bearer {}", pair.access_token);
        let identity = auth.authenticate(Some(&header)).await.unwrap();

        assert_eq!(identity.public_id, PublicUserId(99));
        assert_eq!(identity.session_id, pair.access_session_id);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let (auth, _, _) = authenticator();
        assert_eq!(auth.authenticate(None).await, Err(AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_uncached_session_is_unauthorized() {
        let (auth, factory, _) = authenticator();
        let pair = factory.create_credentials(PublicUserId(99)).unwrap();

        let header = format!("Bearer {}", pair.access_token);
        assert_eq!(auth.authenticate(Some(&header)).await, Err(AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let (auth, factory, sessions) = authenticator();
        let pair = factory.create_credentials(PublicUserId(99)).unwrap();
        sessions.cache(&pair, PublicUserId(99)).await.unwrap();

        let header = format!("Bearer {}", pair.refresh_token);
        assert_eq!(auth.authenticate(Some(&header)).await, Err(AuthError::InvalidToken));
    }
}
