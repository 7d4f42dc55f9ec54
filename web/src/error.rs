//! Error types for web handlers.
//!
//! `AppError` bridges domain errors and HTTP responses. It always renders as
//! an [`Envelope`](crate::envelope::Envelope) with a numeric code, so clients
//! can switch on `code` and ignore the HTTP status if they prefer.

use crate::envelope::{codes, Envelope};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Envelope<Profile>>, AppError> {
///     let profile = load(id).await.map_err(|e| {
///         AppError::new(StatusCode::SERVICE_UNAVAILABLE, 16, "Service unavailable")
///             .with_source(e.into())
///     })?;
///     Ok(respond(profile))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Envelope code (for client error handling)
    code: i32,
    /// Error message (user-facing)
    message: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying error. It is logged, never sent to the client.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Request body could not be decoded.
    #[must_use]
    pub fn decode_json(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::REQUEST_DECODE_JSON,
            codes::REQUEST_DECODE_JSON_MESSAGE,
        )
        .with_source(anyhow::anyhow!(detail.into()))
    }

    /// Generic 500 failure.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::FAILURE,
            codes::FAILURE_MESSAGE,
        )
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Envelope code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Request failed"
                ),
            }
        } else {
            tracing::debug!(
                status = %self.status,
                code = self.code,
                message = %self.message,
                error = ?self.source,
                "Request rejected"
            );
        }

        let body = Envelope::failure(self.code, self.message);

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to a generic failure.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal().with_source(err)
    }
}
