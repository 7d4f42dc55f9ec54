//! Authentication router composition.
//!
//! Composes all authentication handlers into a single Axum router.

use crate::error::AuthError;
use crate::handlers::{profile, require_auth, session, upload};
use crate::providers::{Cache, EmailProvider, StorageProvider, UserRepository};
use crate::service::AuthService;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use orchid_web::handlers::health_check;
use orchid_web::{
    correlation_id_layer, deadline_layer, recovery_layer, trace_layer, AppError,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// Response for a request that outlived the configured deadline.
fn deadline_elapsed() -> AppError {
    AuthError::ServiceUnavailable("request deadline elapsed".to_string()).into()
}

/// Create the authentication router.
///
/// # Routes
///
/// ## Public
/// - `POST /signup` - Request a verification code
/// - `POST /signin` - Exchange a code for tokens
/// - `POST /token/refresh` - Rotate a refresh token
/// - `GET /health` - Liveness
///
/// ## Bearer token required
/// - `GET /signout` - Revoke the session pair
/// - `GET /deregister` - Revoke the session pair and deregister
/// - `GET /profile`, `POST /profile` - Read or change the profile
/// - `POST /account` - Change email
/// - `GET /upload_url` - Presigned upload URL
///
/// Every response is an envelope. Requests are traced, tagged with a
/// correlation id and bounded by the configured deadline (503, code 16, once
/// it elapses). A panic in any handler becomes a 500 envelope.
///
/// # Example
///
/// ```rust,ignore
/// let service = Arc::new(AuthService::new(environment));
///
/// let app = auth_router(service);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// ```
pub fn auth_router<C, U, E, S>(service: Arc<AuthService<C, U, E, S>>) -> Router
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    let authenticator = service.authenticator().clone();
    let deadline = service.config().http.request_deadline;

    let protected = Router::new()
        .route("/signout", get(session::sign_out::<C, U, E, S>))
        .route("/deregister", get(session::deregister::<C, U, E, S>))
        .route(
            "/profile",
            get(profile::get_profile::<C, U, E, S>).post(profile::update_profile::<C, U, E, S>),
        )
        .route("/account", post(profile::change_email::<C, U, E, S>))
        .route("/upload_url", get(upload::upload_url::<C, U, E, S>))
        .route_layer(middleware::from_fn_with_state(
            authenticator,
            require_auth::<C>,
        ));

    Router::new()
        // Session routes
        .route("/signup", post(session::sign_up::<C, U, E, S>))
        .route("/signin", post(session::sign_in::<C, U, E, S>))
        .route("/token/refresh", post(session::refresh::<C, U, E, S>))
        .route("/health", get(health_check))
        .merge(protected)
        .with_state(service)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer())
                .layer(recovery_layer())
                .layer(deadline_layer(deadline, deadline_elapsed))
                .layer(correlation_id_layer()),
        )
}
