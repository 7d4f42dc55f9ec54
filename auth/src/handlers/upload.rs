//! Presigned upload handler.

use crate::error::AuthError;
use crate::handlers::Authenticated;
use crate::providers::{Cache, EmailProvider, StorageProvider, UserRepository};
use crate::service::AuthService;
use axum::extract::{rejection::QueryRejection, Query, State};
use axum::Json;
use orchid_web::{respond, AppError, Envelope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query of `GET /upload_url`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    /// Object name, the content checksum computed by the client.
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Presigned upload target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadUrlResponse {
    /// URL to `PUT` the object to.
    pub presigned_url: String,
}

/// Issue a presigned upload URL.
///
/// # Endpoint
///
/// ```text
/// GET /upload_url?checksum=<sha256>
/// Authorization: Bearer <access_token>
/// ```
pub async fn upload_url<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    Authenticated(identity): Authenticated,
    query: Result<Query<UploadQuery>, QueryRejection>,
) -> Result<Json<Envelope<UploadUrlResponse>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    let Query(query) = query.map_err(|e| AuthError::Validation(e.body_text()))?;
    let checksum = query.checksum.unwrap_or_default();

    let presigned_url = service.upload_url(&identity, &checksum).await?;

    Ok(respond(UploadUrlResponse { presigned_url }))
}
