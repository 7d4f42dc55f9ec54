//! Health check endpoint.
//!
//! Used by load balancers and monitoring systems for liveness. It does not
//! touch the cache or the database.

use crate::envelope::{respond, Envelope};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Liveness payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"healthy"` while the process serves requests.
    pub status: String,

    /// Server time (RFC 3339).
    pub timestamp: String,
}

/// Simple health check endpoint.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "code": 0,
///   "message": "Success",
///   "data": { "status": "healthy", "timestamp": "2026-01-01T00:00:00+00:00" }
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<Envelope<HealthStatus>> {
    respond(HealthStatus {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
