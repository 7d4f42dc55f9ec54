//! Authentication providers.
//!
//! Traits for every external collaborator the auth core talks to. The core
//! depends only on these traits; concrete clients are constructed by the
//! application and injected through [`AuthEnvironment`](crate::environment::AuthEnvironment).
//!
//! | Trait | Production | Development / tests |
//! |---|---|---|
//! | [`Cache`] | `RedisCache` | `MockCache` |
//! | [`UserRepository`] | `PostgresUserRepository` | `MockUserRepository` |
//! | [`EmailProvider`] | [`SmtpEmailProvider`] | [`ConsoleEmailProvider`], `MockEmailProvider` |
//! | [`StorageProvider`] | application supplied | `MockStorageProvider` |

use crate::state::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod console_email;
pub mod email;
pub mod smtp_email;
pub mod storage;
pub mod user;

// Re-export provider traits
pub use cache::Cache;
pub use console_email::ConsoleEmailProvider;
pub use email::EmailProvider;
pub use smtp_email::SmtpEmailProvider;
pub use storage::StorageProvider;
pub use user::UserRepository;

/// User data model.
///
/// Stored in PostgreSQL. Never physically deleted; `deregistered` is a soft
/// delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Sequential row id.
    pub id: UserId,

    /// Unique username.
    pub username: String,

    /// Unique, lowercase email address.
    pub email: String,

    /// Display name chosen at registration.
    pub alias: Option<String>,

    /// Soft-delete flag.
    pub deregistered: bool,

    /// Row created.
    pub created_at: DateTime<Utc>,

    /// Row last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields of a user created (or re-activated) at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Lowercase email address.
    pub email: String,

    /// Username to claim.
    pub username: String,

    /// Display name.
    pub alias: String,
}
