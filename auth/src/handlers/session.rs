//! Session lifecycle handlers.
//!
//! Sign-up, sign-in, token refresh, sign-out and deregistration.

use crate::handlers::Authenticated;
use crate::providers::{Cache, EmailProvider, StorageProvider, UserRepository};
use crate::service::AuthService;
use crate::state::TokenPair;
use axum::{extract::State, Json};
use orchid_web::{respond, respond_empty, AppError, ClientIp, CorrelationId, Envelope, JsonBody};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request a verification code.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignUpRequest {
    /// Email address to verify.
    pub email: String,
}

/// Exchange a verification code for tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignInRequest {
    /// Code from the emailed link.
    pub code: String,

    /// `register` or `login`, as named in the emailed link.
    pub operation: String,

    /// Display name, required when registering.
    #[serde(default)]
    pub alias: Option<String>,
}

/// Rotate a refresh token.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshRequest {
    /// Current refresh token.
    pub refresh_token: String,
}

/// Request a verification code.
///
/// # Endpoint
///
/// ```text
/// POST /signup
/// Content-Type: application/json
///
/// {"email": "a@example.com"}
/// ```
///
/// # Response
///
/// ```json
/// {"code": 0, "message": "Success"}
/// ```
///
/// The emailed link names the operation the code is for. The response does
/// not reveal whether the address already has an account.
pub async fn sign_up<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    correlation_id: CorrelationId,
    ClientIp(client_ip): ClientIp,
    JsonBody(request): JsonBody<SignUpRequest>,
) -> Result<Json<Envelope<()>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    let operation = service.sign_up(&request.email).await?;

    tracing::debug!(
        correlation_id = %correlation_id.0,
        client_ip = %client_ip,
        operation = %operation,
        "Sign-up accepted"
    );

    Ok(respond_empty())
}

/// Exchange a verification code for a token pair.
///
/// # Endpoint
///
/// ```text
/// POST /signin
/// Content-Type: application/json
///
/// {"code": "AbCdEfGhIjKl", "operation": "register", "alias": "Al"}
/// ```
///
/// # Response
///
/// ```json
/// {"code": 0, "message": "Success", "data": {"access_token": "...", "refresh_token": "..."}}
/// ```
pub async fn sign_in<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    ClientIp(client_ip): ClientIp,
    JsonBody(request): JsonBody<SignInRequest>,
) -> Result<Json<Envelope<TokenPair>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    let pair = service
        .sign_in(&request.code, &request.operation, request.alias.as_deref())
        .await
        .inspect_err(|e| {
            // System failures are logged with their source by `AppError`.
            if !e.is_system_error() {
                tracing::info!(client_ip = %client_ip, error = %e, "Sign-in rejected");
            }
        })?;

    Ok(respond(pair))
}

/// Rotate a refresh token into a new pair.
///
/// # Endpoint
///
/// ```text
/// POST /token/refresh
/// Content-Type: application/json
///
/// {"refresh_token": "..."}
/// ```
pub async fn refresh<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> Result<Json<Envelope<TokenPair>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    let pair = service.refresh(&request.refresh_token).await?;

    Ok(respond(pair))
}

/// Revoke the caller's session pair.
///
/// # Endpoint
///
/// ```text
/// GET /signout
/// Authorization: Bearer <access_token>
/// ```
pub async fn sign_out<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Envelope<()>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    service.sign_out(&identity, false).await?;

    Ok(respond_empty())
}

/// Revoke the caller's session pair and deregister the account.
///
/// # Endpoint
///
/// ```text
/// GET /deregister
/// Authorization: Bearer <access_token>
/// ```
pub async fn deregister<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Envelope<()>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    service.sign_out(&identity, true).await?;

    Ok(respond_empty())
}
