//! Axum plumbing for Orchid services.
//!
//! This crate holds the pieces every HTTP surface shares, independent of any
//! particular domain:
//!
//! - [`Envelope`]: the uniform `{code, message, data}` response body
//! - [`AppError`]: errors that render as envelopes with a stable numeric code
//! - extractors for correlation ids, client IPs and JSON bodies
//! - layers for correlation tracking, panic recovery, deadlines and tracing
//!
//! # Example
//!
//! ```ignore
//! use orchid_web::{respond, AppError, Envelope, JsonBody};
//! use axum::{routing::post, Json, Router};
//!
//! async fn handle(
//!     JsonBody(request): JsonBody<Request>,
//! ) -> Result<Json<Envelope<Reply>>, AppError> {
//!     let reply = service.handle(request).await.map_err(AppError::from)?;
//!     Ok(respond(reply))
//! }
//!
//! let app = Router::new()
//!     .route("/handle", post(handle))
//!     .layer(orchid_web::correlation_id_layer())
//!     .layer(orchid_web::recovery_layer());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod envelope;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use envelope::{codes, respond, respond_empty, Envelope};
pub use error::AppError;
pub use extractors::{ClientIp, CorrelationId, JsonBody};
pub use middleware::{
    correlation_id_layer, deadline_layer, recovery_layer, trace_layer, DeadlineLayer,
    CORRELATION_ID_HEADER,
};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
