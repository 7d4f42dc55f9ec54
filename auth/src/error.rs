//! Error types for authentication and session operations.

use std::fmt;
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Which unique column a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    /// `users.email`
    Email,
    /// `users.username`
    Username,
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("Email"),
            Self::Username => f.write_str("Username"),
        }
    }
}

/// Error taxonomy for the auth core.
///
/// Variants are grouped the way callers treat them: expected outcomes that
/// go straight back to the client, and system failures that are logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════

    /// Email is malformed or its domain does not resolve.
    #[error("Invalid email")]
    InvalidEmail,

    /// Verification code has the wrong shape.
    #[error("Invalid verification code")]
    InvalidVerificationCode,

    /// Registration without an alias.
    #[error("Alias must not be empty")]
    EmptyAlias,

    /// Any other malformed input.
    #[error("Invalid input: {0}")]
    Validation(String),

    // ═══════════════════════════════════════════════════════════
    // Verification codes
    // ═══════════════════════════════════════════════════════════

    /// Code absent: expired, consumed, evicted, or never issued.
    #[error("Verification code expired")]
    CodeExpired,

    /// Declared operation differs from the one recorded at issuance.
    #[error("Invalid operation")]
    InvalidOperation,

    // ═══════════════════════════════════════════════════════════
    // Credentials and sessions
    // ═══════════════════════════════════════════════════════════

    /// Missing, expired or unparseable token, or session not cached.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad signature, wrong algorithm, or malformed claims.
    #[error("Invalid token")]
    InvalidToken,

    /// Revocation found a session id already gone.
    #[error("Token already expired")]
    AlreadyExpired,

    // ═══════════════════════════════════════════════════════════
    // Users
    // ═══════════════════════════════════════════════════════════

    /// Deregistering a user that is already deregistered.
    #[error("User already deregistered")]
    AlreadyDeregistered,

    /// Unique constraint violation.
    #[error("{0} already in use")]
    AlreadyInUse(ConflictField),

    /// No active user row for the given key.
    #[error("User not found")]
    UserNotFound,

    /// Identifier outside the obfuscator's domain.
    #[error("Identifier out of range: {0}")]
    OutOfRange(i64),

    // ═══════════════════════════════════════════════════════════
    // System
    // ═══════════════════════════════════════════════════════════

    /// Cache, database, mail or storage collaborator unreachable.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Unexpected failure (signing, encoding, corrupt cache value).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` if this error is due to invalid user input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use orchid_auth::AuthError;
    /// assert!(AuthError::EmptyAlias.is_user_error());
    /// assert!(!AuthError::Internal("boom".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail
                | Self::InvalidVerificationCode
                | Self::EmptyAlias
                | Self::Validation(_)
        )
    }

    /// Returns `true` for failures that operators should see at error level.
    ///
    /// # Examples
    ///
    /// ```
    /// # use orchid_auth::AuthError;
    /// assert!(AuthError::ServiceUnavailable("redis".into()).is_system_error());
    /// assert!(!AuthError::CodeExpired.is_system_error());
    /// ```
    #[must_use]
    pub const fn is_system_error(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::Internal(_) | Self::OutOfRange(_)
        )
    }

    /// Stable response code for this error.
    #[must_use]
    pub const fn response_code(&self) -> ResponseCode {
        match self {
            Self::InvalidEmail => ResponseCode::InvalidEmail,
            Self::InvalidVerificationCode => ResponseCode::InvalidVerificationCode,
            Self::EmptyAlias => ResponseCode::EmptyAlias,
            Self::Validation(_) => ResponseCode::InvalidInput,
            Self::CodeExpired => ResponseCode::VerificationCodeExpired,
            Self::InvalidOperation => ResponseCode::InvalidOperation,
            Self::Unauthorized => ResponseCode::Unauthorized,
            Self::InvalidToken => ResponseCode::InvalidToken,
            Self::AlreadyExpired => ResponseCode::TokenExpired,
            Self::AlreadyDeregistered => ResponseCode::AlreadyDeregistered,
            Self::AlreadyInUse(ConflictField::Email) => ResponseCode::EmailAlreadyInUse,
            Self::AlreadyInUse(ConflictField::Username) => ResponseCode::UsernameAlreadyInUse,
            Self::UserNotFound => ResponseCode::UserNotFound,
            Self::ServiceUnavailable(_) => ResponseCode::ServiceUnavailable,
            Self::Internal(_) | Self::OutOfRange(_) => ResponseCode::InternalServer,
        }
    }
}

/// Envelope codes.
///
/// The discriminant is the wire value. `0..=2` coincide with the generic
/// codes of the web layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResponseCode {
    /// Request succeeded.
    Success = 0,
    /// Unclassified failure.
    Failure = 1,
    /// Request body was not valid JSON for the endpoint.
    RequestDecodeJson = 2,
    /// Email malformed or unresolvable.
    InvalidEmail = 3,
    /// Verification code malformed.
    InvalidVerificationCode = 4,
    /// Alias missing on registration.
    EmptyAlias = 5,
    /// Other malformed input.
    InvalidInput = 6,
    /// Verification code absent.
    VerificationCodeExpired = 7,
    /// Operation mismatch.
    InvalidOperation = 8,
    /// Not authenticated.
    Unauthorized = 9,
    /// Token failed verification.
    InvalidToken = 10,
    /// Session already revoked or expired.
    TokenExpired = 11,
    /// User already deregistered.
    AlreadyDeregistered = 12,
    /// Email taken.
    EmailAlreadyInUse = 13,
    /// Username taken.
    UsernameAlreadyInUse = 14,
    /// No such user.
    UserNotFound = 15,
    /// Dependency unreachable.
    ServiceUnavailable = 16,
    /// Unexpected failure.
    InternalServer = 17,
}

impl ResponseCode {
    /// Wire value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Message paired with this code.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::RequestDecodeJson => "Request JSON decoding failed",
            Self::InvalidEmail => "Invalid email",
            Self::InvalidVerificationCode => "Invalid verification code",
            Self::EmptyAlias => "Alias must not be empty",
            Self::InvalidInput => "Invalid input",
            Self::VerificationCodeExpired => "Verification code expired",
            Self::InvalidOperation => "Invalid operation",
            Self::Unauthorized => "Unauthorized",
            Self::InvalidToken => "Invalid token",
            Self::TokenExpired => "Token already expired",
            Self::AlreadyDeregistered => "User already deregistered",
            Self::EmailAlreadyInUse => "Email already in use",
            Self::UsernameAlreadyInUse => "Username already in use",
            Self::UserNotFound => "User not found",
            Self::ServiceUnavailable => "Service unavailable",
            Self::InternalServer => "Internal server error",
        }
    }
}
