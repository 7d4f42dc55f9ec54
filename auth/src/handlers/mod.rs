//! HTTP handlers for authentication endpoints.
//!
//! Handlers are thin: decode the request, call [`AuthService`](crate::AuthService),
//! wrap the result in an envelope. Every [`AuthError`] converts into an
//! [`AppError`] carrying its stable response code.

use crate::error::AuthError;
use axum::http::StatusCode;
use orchid_web::AppError;

pub mod middleware;
pub mod profile;
pub mod session;
pub mod upload;

pub use middleware::{optional_auth, require_auth, Authenticated, MaybeAuthenticated};

/// HTTP status paired with an error.
#[must_use]
pub const fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidEmail
        | AuthError::InvalidVerificationCode
        | AuthError::EmptyAlias
        | AuthError::Validation(_)
        | AuthError::CodeExpired
        | AuthError::InvalidOperation => StatusCode::BAD_REQUEST,
        AuthError::Unauthorized | AuthError::InvalidToken | AuthError::AlreadyExpired => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::AlreadyDeregistered | AuthError::AlreadyInUse(_) => StatusCode::CONFLICT,
        AuthError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Internal(_) | AuthError::OutOfRange(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let code = err.response_code();
        let app = Self::new(status_for(&err), code.as_i32(), code.message());

        // Expected outcomes carry no source; system failures keep theirs for the log.
        if err.is_system_error() || matches!(err, AuthError::Validation(_)) {
            app.with_source(anyhow::Error::new(err))
        } else {
            app
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConflictField;

    #[test]
    fn test_conversion_keeps_code_and_hides_detail() {
        let app = AppError::from(AuthError::Internal("key material missing".into()));
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.code(), 17);
        assert_eq!(app.message(), "Internal server error");
    }

    #[test]
    fn test_only_system_and_validation_errors_keep_source() {
        use std::error::Error as _;

        assert!(AppError::from(AuthError::ServiceUnavailable("redis".into()))
            .source()
            .is_some());
        assert!(AppError::from(AuthError::OutOfRange(1 << 31)).source().is_some());
        assert!(AppError::from(AuthError::Validation("bad".into())).source().is_some());
        assert!(AppError::from(AuthError::Unauthorized).source().is_none());
        assert!(AppError::from(AuthError::AlreadyDeregistered).source().is_none());
    }

    #[test]
    fn test_statuses() {
        assert_eq!(status_for(&AuthError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&AuthError::AlreadyInUse(ConflictField::Email)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&AuthError::ServiceUnavailable("redis".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_user_errors_are_bad_requests() {
        for err in [
            AuthError::InvalidEmail,
            AuthError::InvalidVerificationCode,
            AuthError::EmptyAlias,
            AuthError::Validation("x".into()),
        ] {
            assert!(err.is_user_error());
            assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
        }
    }
}
