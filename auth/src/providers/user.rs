//! User repository trait.

use super::{NewUser, User};
use crate::error::Result;
use crate::state::UserId;

/// User repository.
///
/// This trait abstracts over the relational user store. Every write is a
/// single transaction at serializable isolation; a failed write is rolled
/// back and never partially committed.
pub trait UserRepository: Send + Sync {
    /// Active (not deregistered) user owning `email`.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn find_active_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>>> + Send;

    /// User by row id, including deregistered users.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn find_by_id(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>>> + Send;

    /// Whether any user, active or not, holds `username`.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn username_taken(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Insert a user, or re-activate the row already holding this email
    /// (clearing `deregistered` and replacing the alias). Returns the row id.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The username is held by another row → `AuthError::AlreadyInUse`
    /// - Database query fails
    fn upsert(&self, user: &NewUser) -> impl std::future::Future<Output = Result<UserId>> + Send;

    /// Change a user's username.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Username held by another row → `AuthError::AlreadyInUse`
    /// - User not found → `AuthError::UserNotFound`
    /// - Database query fails
    fn update_username(
        &self,
        id: UserId,
        username: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Change a user's email.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Email held by another row → `AuthError::AlreadyInUse`
    /// - User not found → `AuthError::UserNotFound`
    /// - Database query fails
    fn update_email(
        &self,
        id: UserId,
        email: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Set `deregistered = true`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Already deregistered → `AuthError::AlreadyDeregistered`
    /// - User not found → `AuthError::UserNotFound`
    /// - Database query fails
    fn deregister(&self, id: UserId) -> impl std::future::Future<Output = Result<()>> + Send;
}
