//! Authentication environment.
//!
//! The collaborators the auth core needs, constructed by the application and
//! injected explicitly. There are no ambient global clients.

use crate::config::AuthConfig;
use crate::providers::{Cache, EmailProvider, StorageProvider, UserRepository};

/// Authentication environment.
///
/// # Type Parameters
///
/// - `C`: Key-value cache (codes and sessions)
/// - `U`: User repository
/// - `E`: Email provider
/// - `S`: Object storage
///
/// # Example
///
/// ```ignore
/// let env = AuthEnvironment::new(
///     RedisCache::new("redis://127.0.0.1:6379").await?,
///     PostgresUserRepository::new(pool),
///     SmtpEmailProvider::new("smtp.example.com", 587, user, pass, "noreply@example.com", "Orchid")?,
///     storage,
///     AuthConfig::new(CredentialConfig::new(access_secret, refresh_secret)),
/// );
/// let service = AuthService::new(env);
/// ```
#[derive(Clone)]
pub struct AuthEnvironment<C, U, E, S>
where
    C: Cache + Clone,
    U: UserRepository,
    E: EmailProvider + Clone,
    S: StorageProvider,
{
    /// Codes and sessions.
    pub cache: C,

    /// User accounts.
    pub users: U,

    /// Outbound mail.
    pub email: E,

    /// Presigned uploads.
    pub storage: S,

    /// Configuration.
    pub config: AuthConfig,
}

impl<C, U, E, S> AuthEnvironment<C, U, E, S>
where
    C: Cache + Clone,
    U: UserRepository,
    E: EmailProvider + Clone,
    S: StorageProvider,
{
    /// Create a new authentication environment.
    #[must_use]
    pub const fn new(cache: C, users: U, email: E, storage: S, config: AuthConfig) -> Self {
        Self {
            cache,
            users,
            email,
            storage,
            config,
        }
    }
}
