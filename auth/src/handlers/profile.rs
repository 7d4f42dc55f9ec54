//! Profile handlers.

use crate::error::AuthError;
use crate::handlers::Authenticated;
use crate::providers::{Cache, EmailProvider, StorageProvider, UserRepository};
use crate::service::{AuthService, Profile, ProfileUpdate};
use axum::{extract::State, Json};
use orchid_web::{respond, respond_empty, AppError, Envelope, JsonBody};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Profile change. Exactly one field must be set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    /// New username.
    #[serde(default)]
    pub username: Option<String>,

    /// New email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl TryFrom<UpdateProfileRequest> for ProfileUpdate {
    type Error = AuthError;

    fn try_from(request: UpdateProfileRequest) -> Result<Self, Self::Error> {
        match (request.username, request.email) {
            (Some(username), None) => Ok(Self::Username(username)),
            (None, Some(email)) => Ok(Self::Email(email)),
            _ => Err(AuthError::Validation(
                "exactly one of username or email must be set".to_string(),
            )),
        }
    }
}

/// Move the account to a new email address.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangeEmailRequest {
    /// New email address.
    pub email: String,
}

/// Read the caller's profile.
///
/// # Endpoint
///
/// ```text
/// GET /profile
/// Authorization: Bearer <access_token>
/// ```
///
/// # Response
///
/// ```json
/// {"code": 0, "message": "Success", "data": {"username": "a", "email": "a@example.com"}}
/// ```
pub async fn get_profile<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Envelope<Profile>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    let profile = service.get_profile(&identity).await?;

    Ok(respond(profile))
}

/// Change the caller's username or email.
///
/// # Endpoint
///
/// ```text
/// POST /profile
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {"username": "al"}
/// ```
pub async fn update_profile<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    Authenticated(identity): Authenticated,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> Result<Json<Envelope<()>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    let update = ProfileUpdate::try_from(request)?;
    service.update_profile(&identity, update).await?;

    Ok(respond_empty())
}

/// Move the caller's account to a new email address.
///
/// # Endpoint
///
/// ```text
/// POST /account
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {"email": "new@example.com"}
/// ```
///
/// A login code is sent to the new address.
pub async fn change_email<C, U, E, S>(
    State(service): State<Arc<AuthService<C, U, E, S>>>,
    Authenticated(identity): Authenticated,
    JsonBody(request): JsonBody<ChangeEmailRequest>,
) -> Result<Json<Envelope<()>>, AppError>
where
    C: Cache + Clone + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + Clone + 'static,
    S: StorageProvider + 'static,
{
    service.change_email(&identity, &request.email).await?;

    Ok(respond_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_requires_exactly_one_field() {
        let both = UpdateProfileRequest {
            username: Some("a".into()),
            email: Some("a@example.com".into()),
        };
        assert!(matches!(
            ProfileUpdate::try_from(both),
            Err(AuthError::Validation(_))
        ));
        assert!(ProfileUpdate::try_from(UpdateProfileRequest::default()).is_err());

        let username = UpdateProfileRequest {
            username: Some("al".into()),
            email: None,
        };
        assert_eq!(
            ProfileUpdate::try_from(username),
            Ok(ProfileUpdate::Username("al".into()))
        );
    }
}
