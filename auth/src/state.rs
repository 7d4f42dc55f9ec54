//! Core domain types.
//!
//! Identifier newtypes, the verification operation tag, the issued credential
//! pair and the identity the middleware hands to handlers.

use crate::constants::credentials::REFRESH_ID_SEPARATOR;
use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Sequential row id of a user. Never leaves the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Obfuscated user id exposed to clients and embedded in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicUserId(pub u32);

impl fmt::Display for PublicUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PublicUserId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(Self)
            .map_err(|e| AuthError::Internal(format!("corrupt public user id {s:?}: {e}")))
    }
}

/// Session id: the cache revocation handle embedded in a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh random access session id (UUID v4).
    #[must_use]
    pub fn new_access() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Refresh session id paired with `access`: `{access}++{public_id}`.
    #[must_use]
    pub fn refresh_for(access: &Self, public_id: PublicUserId) -> Self {
        Self(format!("{}{REFRESH_ID_SEPARATOR}{public_id}", access.0))
    }

    /// Split a refresh session id into its access session id and public user id.
    ///
    /// Returns `None` if this is not a well-formed refresh session id.
    #[must_use]
    pub fn split_refresh(&self) -> Option<(Self, PublicUserId)> {
        let (access, public) = self.0.rsplit_once(REFRESH_ID_SEPARATOR)?;
        if access.is_empty() {
            return None;
        }
        let public = public.parse::<u32>().ok()?;
        Some((Self(access.to_string()), PublicUserId(public)))
    }

    /// Borrow as `&str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Verification
// ═══════════════════════════════════════════════════════════════════════

/// What a verification code authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// First sign-in for an email; creates the user.
    Register,
    /// Sign-in for an existing user.
    Login,
}

impl Operation {
    /// Wire and cache representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(Self::Register),
            "login" => Ok(Self::Login),
            _ => Err(AuthError::InvalidOperation),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Credentials
// ═══════════════════════════════════════════════════════════════════════

/// Signed access/refresh tokens plus their revocation handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    /// Short-lived token for API calls.
    pub access_token: String,

    /// Long-lived token used only to mint a new pair.
    pub refresh_token: String,

    /// Session id embedded in the access token.
    pub access_session_id: SessionId,

    /// Session id embedded in the refresh token.
    pub refresh_session_id: SessionId,

    /// When the access token expires.
    pub access_expires_at: DateTime<Utc>,

    /// When the refresh token expires.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Token pair as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token.
    pub access_token: String,

    /// Refresh token.
    pub refresh_token: String,
}

impl From<CredentialPair> for TokenPair {
    fn from(pair: CredentialPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Authenticated caller, injected into request extensions by the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Obfuscated user id from the access token.
    pub public_id: PublicUserId,

    /// Access session id from the access token.
    pub session_id: SessionId,
}

impl Identity {
    /// Refresh session id paired with this access session.
    #[must_use]
    pub fn refresh_session_id(&self) -> SessionId {
        SessionId::refresh_for(&self.session_id, self.public_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_id_derivation_round_trips() {
        let access = SessionId::new_access();
        let refresh = SessionId::refresh_for(&access, PublicUserId(117_653_972));

        assert_eq!(refresh.as_str(), format!("{access}++117653972"));
        assert_eq!(
            refresh.split_refresh(),
            Some((access, PublicUserId(117_653_972)))
        );
    }

    #[test]
    fn test_split_refresh_rejects_malformed_ids() {
        assert_eq!(SessionId::from("no-separator".to_string()).split_refresh(), None);
        assert_eq!(SessionId::from("++42".to_string()).split_refresh(), None);
        assert_eq!(SessionId::from("abc++x".to_string()).split_refresh(), None);
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!("register".parse::<Operation>(), Ok(Operation::Register));
        assert_eq!("login".parse::<Operation>(), Ok(Operation::Login));
        assert!("Login".parse::<Operation>().is_err());
        assert_eq!(Operation::Register.to_string(), "register");
    }

    #[test]
    fn test_identity_refresh_id() {
        let identity = Identity {
            public_id: PublicUserId(7),
            session_id: SessionId::from("abc".to_string()),
        };
        assert_eq!(identity.refresh_session_id().as_str(), "abc++7");
    }
}
