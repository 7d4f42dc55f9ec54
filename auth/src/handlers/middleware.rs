//! Authentication middleware and identity extractors.
//!
//! Two gates, both built with [`axum::middleware::from_fn_with_state`] over
//! an [`Authenticator`]:
//!
//! - [`require_auth`]: rejects requests without a live session
//! - [`optional_auth`]: passes requests without an `Authorization` header
//!   through untouched, otherwise behaves like `require_auth`
//!
//! On success the [`Identity`] is stored in request extensions, where the
//! [`Authenticated`] and [`MaybeAuthenticated`] extractors find it.
//!
//! # Example
//!
//! ```ignore
//! let protected = Router::new()
//!     .route("/profile", get(get_profile))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         service.authenticator().clone(),
//!         require_auth::<RedisCache>,
//!     ));
//! ```

use crate::authenticator::Authenticator;
use crate::error::AuthError;
use crate::providers::Cache;
use crate::state::Identity;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use orchid_web::AppError;

/// Raw `Authorization` value, if present and valid UTF-8.
fn authorization(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn authenticate_into<C: Cache>(
    authenticator: &Authenticator<C>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = authorization(&request);
    let identity = authenticator.authenticate(header.as_deref()).await?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Reject the request unless it carries a live access token.
///
/// # Errors
///
/// - `Unauthorized` (401, code 9) for a missing, expired or revoked token
/// - `InvalidToken` (401, code 10) for a forged or malformed token
/// - `ServiceUnavailable` (503, code 16) if the cache is unreachable
pub async fn require_auth<C>(
    State(authenticator): State<Authenticator<C>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    C: Cache + Clone + 'static,
{
    authenticate_into(&authenticator, request, next).await
}

/// Authenticate when an `Authorization` header is present.
///
/// # Errors
///
/// Same as [`require_auth`] once a header is present.
pub async fn optional_auth<C>(
    State(authenticator): State<Authenticator<C>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    C: Cache + Clone + 'static,
{
    if !request.headers().contains_key(AUTHORIZATION) {
        return Ok(next.run(request).await);
    }

    authenticate_into(&authenticator, request, next).await
}

/// Identity of an authenticated caller.
///
/// Only usable behind [`require_auth`]; elsewhere it rejects with `Unauthorized`.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::from(AuthError::Unauthorized))
    }
}

/// Identity of the caller, if one was established by [`optional_auth`].
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}
