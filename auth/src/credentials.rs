//! Signed access/refresh credentials.
//!
//! Tokens are HS256 JWTs. Access and refresh tokens are signed with distinct
//! secrets, so a leaked refresh secret cannot forge access tokens and vice
//! versa. Claims are decoded into typed structs; unknown fields are rejected.

use crate::config::CredentialConfig;
use crate::error::{AuthError, Result};
use crate::state::{CredentialPair, PublicUserId, SessionId};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    /// Always `true` for tokens minted here.
    pub authorized: bool,
    /// Access session id.
    pub access_uuid: String,
    /// Public user id.
    pub user_id: u32,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Claims of a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    /// Refresh session id, `{access_uuid}++{user_id}`.
    pub refresh_uuid: String,
    /// Public user id.
    pub user_id: u32,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Mints and verifies credential pairs.
#[derive(Debug, Clone)]
pub struct CredentialFactory {
    config: CredentialConfig,
}

impl CredentialFactory {
    /// Create a factory from signing configuration.
    #[must_use]
    pub const fn new(config: CredentialConfig) -> Self {
        Self { config }
    }

    /// Mint a new access/refresh pair for `public_id`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if either secret is empty or signing fails.
    pub fn create_credentials(&self, public_id: PublicUserId) -> Result<CredentialPair> {
        let now = Utc::now();
        let access_expires_at = now + self.config.access_ttl;
        let refresh_expires_at = now + self.config.refresh_ttl;

        let access_session_id = SessionId::new_access();
        let refresh_session_id = SessionId::refresh_for(&access_session_id, public_id);

        let access_token = sign(
            &AccessClaims {
                authorized: true,
                access_uuid: access_session_id.as_str().to_string(),
                user_id: public_id.0,
                exp: access_expires_at.timestamp(),
            },
            &self.config.access_secret,
        )?;

        let refresh_token = sign(
            &RefreshClaims {
                refresh_uuid: refresh_session_id.as_str().to_string(),
                user_id: public_id.0,
                exp: refresh_expires_at.timestamp(),
            },
            &self.config.refresh_secret,
        )?;

        Ok(CredentialPair {
            access_token,
            refresh_token,
            access_session_id,
            refresh_session_id,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Verify an access token's signature and expiry.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the token is expired or not a JWT
    /// - `InvalidToken` on a bad signature, another algorithm, or unexpected claims
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        let claims: AccessClaims = verify(token, &self.config.access_secret)?;
        if !claims.authorized {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Verify a refresh token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Same classification as [`verify_access`](Self::verify_access).
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        verify(token, &self.config.refresh_secret)
    }
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String> {
    if secret.is_empty() {
        return Err(AuthError::Internal("signing secret is empty".to_string()));
    }

    encode(
        &Header::new(ALGORITHM),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("failed to sign token: {e}")))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T> {
    if secret.is_empty() {
        return Err(AuthError::Internal("verification secret is empty".to_string()));
    }

    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;

    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| classify(e.kind()))
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature
        | ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Utf8(_) => AuthError::Unauthorized,
        _ => AuthError::InvalidToken,
    }
}

/// Remaining lifetime of a credential expiring at `expires_at`.
#[must_use]
pub fn remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    (expires_at - now)
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
        .max(std::time::Duration::from_secs(1))
}
