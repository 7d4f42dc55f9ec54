//! # Orchid Authentication
//!
//! Authentication and session-lifecycle core: passwordless email sign-in,
//! JWT access/refresh credentials with cache-backed revocation, and
//! reversible obfuscation of public user identifiers.
//!
//! ## Components
//!
//! - [`IdentifierObfuscator`]: keyed bijection between row ids and public ids
//! - [`VerificationCodeStore`]: single-use email codes with TTL
//! - [`CredentialFactory`]: signs and verifies access/refresh token pairs
//! - [`CredentialCache`]: session entries, the authority on "still logged in"
//! - [`Authenticator`]: per-request bearer-token gate
//! - [`AuthService`]: sign-up, sign-in, refresh, sign-out, deregister, profile
//!
//! All cross-request state lives behind the [`Cache`](providers::Cache) and
//! [`UserRepository`](providers::UserRepository) traits; concrete clients are
//! injected through [`AuthEnvironment`].
//!
//! ## Flow
//!
//! ```text
//! POST /signup  → code emailed (register | login)
//! POST /signin  → code consumed → pair minted → sessions cached → tokens
//! any request   → Authorization: Bearer → signature + cache check → Identity
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use orchid_auth::*;
//!
//! let env = AuthEnvironment::new(
//!     RedisCache::new("redis://127.0.0.1:6379").await?,
//!     users,
//!     ConsoleEmailProvider::new(),
//!     storage,
//!     AuthConfig::new(CredentialConfig::new(access_secret, refresh_secret)),
//! );
//! let service = Arc::new(AuthService::new(env));
//!
//! let app = router::auth_router(service);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod authenticator;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod obfuscator;
pub mod providers;
pub mod service;
pub mod sessions;
pub mod state;
pub mod stores;
pub mod templates;
pub mod utils;
pub mod verification;

// HTTP surface
#[cfg(feature = "axum")]
pub mod handlers;
#[cfg(feature = "axum")]
pub mod router;

// Test utilities
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use authenticator::Authenticator;
pub use config::{AuthConfig, CredentialConfig, HttpConfig, UploadConfig, VerificationConfig};
pub use credentials::CredentialFactory;
pub use environment::AuthEnvironment;
pub use error::{AuthError, ConflictField, ResponseCode, Result};
pub use obfuscator::IdentifierObfuscator;
pub use service::{AuthService, Profile, ProfileUpdate};
pub use sessions::CredentialCache;
pub use state::{CredentialPair, Identity, Operation, PublicUserId, SessionId, TokenPair, UserId};
pub use verification::VerificationCodeStore;

#[cfg(feature = "axum")]
pub use router::auth_router;
