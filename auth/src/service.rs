//! Session flows.
//!
//! [`AuthService`] orchestrates sign-up, sign-in, token refresh, sign-out,
//! deregistration and profile maintenance over the components in this crate.
//! Every method returns a typed [`AuthError`]; nothing is retried here.

use crate::authenticator::Authenticator;
use crate::config::AuthConfig;
use crate::constants::users::MAX_NAME_LENGTH;
use crate::credentials::CredentialFactory;
use crate::environment::AuthEnvironment;
use crate::error::{AuthError, Result};
use crate::obfuscator::IdentifierObfuscator;
use crate::providers::{Cache, EmailProvider, NewUser, StorageProvider, UserRepository};
use crate::sessions::CredentialCache;
use crate::state::{Identity, Operation, SessionId, TokenPair, UserId};
use crate::utils::{
    domain_resolves, is_valid_email, is_valid_username, normalize_email, random_username,
    username_from_email,
};
use crate::verification::{is_well_formed_code, VerificationCodeStore};
use serde::{Deserialize, Serialize};

/// Longest accepted upload checksum.
const MAX_CHECKSUM_LENGTH: usize = 128;

/// Profile fields visible to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
}

/// A single-column profile change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdate {
    /// New username.
    Username(String),
    /// New email address. Also issues a login code to it.
    Email(String),
}

/// Authentication service.
pub struct AuthService<C, U, E, S>
where
    C: Cache + Clone,
    U: UserRepository,
    E: EmailProvider + Clone,
    S: StorageProvider,
{
    verification: VerificationCodeStore<C, E>,
    credentials: CredentialFactory,
    sessions: CredentialCache<C>,
    authenticator: Authenticator<C>,
    obfuscator: IdentifierObfuscator,
    users: U,
    storage: S,
    config: AuthConfig,
}

impl<C, U, E, S> AuthService<C, U, E, S>
where
    C: Cache + Clone,
    U: UserRepository,
    E: EmailProvider + Clone,
    S: StorageProvider,
{
    /// Build the service from its environment.
    #[must_use]
    pub fn new(env: AuthEnvironment<C, U, E, S>) -> Self {
        let AuthEnvironment {
            cache,
            users,
            email,
            storage,
            config,
        } = env;

        let credentials = CredentialFactory::new(config.credentials.clone());
        let sessions = CredentialCache::new(cache.clone());

        Self {
            verification: VerificationCodeStore::new(cache, email, config.verification.clone()),
            authenticator: Authenticator::new(credentials.clone(), sessions.clone()),
            credentials,
            sessions,
            obfuscator: IdentifierObfuscator::default(),
            users,
            storage,
            config,
        }
    }

    /// Use a custom identifier permutation.
    #[must_use]
    pub fn with_obfuscator(mut self, obfuscator: IdentifierObfuscator) -> Self {
        self.obfuscator = obfuscator;
        self
    }

    /// Authenticator for the HTTP middleware.
    #[must_use]
    pub const fn authenticator(&self) -> &Authenticator<C> {
        &self.authenticator
    }

    /// Service configuration.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Request a verification code for `email`.
    ///
    /// Returns the operation the code was tagged with: `Login` if an active
    /// user owns the address, `Register` otherwise.
    ///
    /// # Errors
    ///
    /// - `InvalidEmail` if the address is malformed or its domain does not resolve
    /// - `ServiceUnavailable` if the cache, database or mailer is unreachable
    #[tracing::instrument(skip_all)]
    pub async fn sign_up(&self, email: &str) -> Result<Operation> {
        let email = self.checked_email(email).await?;

        let operation = if self.users.find_active_by_email(&email).await?.is_some() {
            Operation::Login
        } else {
            Operation::Register
        };

        self.verification.issue_code(&email, operation).await?;

        Ok(operation)
    }

    /// Exchange a verification code for a credential pair.
    ///
    /// `operation` is what the client believes the code was issued for; it
    /// must match the recorded one.
    ///
    /// # Errors
    ///
    /// - `InvalidVerificationCode` if the code has the wrong shape
    /// - `InvalidOperation` if `operation` is unknown or does not match
    /// - `CodeExpired` if the code is absent or already consumed
    /// - `EmptyAlias` when registering without an alias
    /// - `UserNotFound` when logging in to an account that no longer exists
    /// - `AlreadyInUse` if the chosen username was claimed concurrently
    /// - `ServiceUnavailable` if a backend is unreachable
    #[tracing::instrument(skip_all, fields(operation = %operation))]
    pub async fn sign_in(
        &self,
        code: &str,
        operation: &str,
        alias: Option<&str>,
    ) -> Result<TokenPair> {
        if !is_well_formed_code(code) {
            return Err(AuthError::InvalidVerificationCode);
        }
        let declared = operation.parse::<Operation>()?;

        let (recorded, email) = self.verification.consume_code(code).await?;
        if declared != recorded {
            tracing::warn!(declared = %declared, recorded = %recorded, "Operation mismatch");
            return Err(AuthError::InvalidOperation);
        }

        let user_id = match recorded {
            Operation::Login => {
                self.users
                    .find_active_by_email(&email)
                    .await?
                    .ok_or(AuthError::UserNotFound)?
                    .id
            }
            Operation::Register => self.register(&email, alias).await?,
        };

        let pair = self.issue_session(user_id).await?;

        tracing::info!(user_id = user_id.0, "User signed in");

        Ok(pair)
    }

    /// Rotate a refresh token into a new credential pair.
    ///
    /// The presented refresh session and its paired access session are
    /// revoked first; a replayed refresh token fails.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the token is expired, unparseable, or its session is gone
    /// - `InvalidToken` if the signature or claims are wrong
    /// - `AlreadyExpired` if a concurrent refresh revoked the session first
    /// - `ServiceUnavailable` if the cache is unreachable
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.credentials.verify_refresh(refresh_token)?;
        let refresh_id = SessionId::from(claims.refresh_uuid);

        if !self.sessions.exists(&refresh_id).await? {
            tracing::warn!("Refresh token presented for a dead session");
            return Err(AuthError::Unauthorized);
        }

        let (access_id, public_id) = refresh_id.split_refresh().ok_or(AuthError::InvalidToken)?;
        if public_id.0 != claims.user_id {
            return Err(AuthError::InvalidToken);
        }

        self.sessions.revoke(std::slice::from_ref(&refresh_id)).await?;

        match self.sessions.revoke(&[access_id]).await {
            Ok(()) | Err(AuthError::AlreadyExpired) => {}
            Err(e) => return Err(e),
        }

        let pair = self.credentials.create_credentials(public_id)?;
        self.sessions.cache(&pair, public_id).await?;

        tracing::info!(public_id = %public_id, "Credentials refreshed");

        Ok(pair.into())
    }

    /// Revoke the caller's session pair, optionally deregistering the user.
    ///
    /// # Errors
    ///
    /// - `AlreadyExpired` if either session was already gone
    /// - `AlreadyDeregistered` if deregistering twice
    /// - `ServiceUnavailable` if a backend is unreachable
    #[tracing::instrument(skip_all, fields(public_id = %identity.public_id, deregister = deregister))]
    pub async fn sign_out(&self, identity: &Identity, deregister: bool) -> Result<()> {
        self.sessions
            .revoke(&[identity.session_id.clone(), identity.refresh_session_id()])
            .await?;

        if deregister {
            let user_id = self.obfuscator.decode(identity.public_id)?;
            self.users.deregister(user_id).await?;
            tracing::info!(user_id = user_id.0, "User deregistered");
        } else {
            tracing::info!("User signed out");
        }

        Ok(())
    }

    /// Profile of the caller.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the account is gone or deregistered
    /// - `ServiceUnavailable` if the database is unreachable
    pub async fn get_profile(&self, identity: &Identity) -> Result<Profile> {
        let user = self.active_user(identity).await?;

        Ok(Profile {
            username: user.username,
            email: user.email,
        })
    }

    /// Apply a single-column profile change.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed username
    /// - `InvalidEmail` for a malformed email
    /// - `AlreadyInUse` if another account holds the value
    /// - `UserNotFound` if the account is gone or deregistered
    #[tracing::instrument(skip_all, fields(public_id = %identity.public_id))]
    pub async fn update_profile(&self, identity: &Identity, update: ProfileUpdate) -> Result<()> {
        match update {
            ProfileUpdate::Username(username) => {
                let username = username.trim();
                if !is_valid_username(username) {
                    return Err(AuthError::Validation(format!(
                        "username must be 1 to {MAX_NAME_LENGTH} characters of [A-Za-z0-9._-]"
                    )));
                }
                let user_id = self.obfuscator.decode(identity.public_id)?;
                self.users.update_username(user_id, username).await?;
                tracing::info!(user_id = user_id.0, "Username changed");
                Ok(())
            }
            ProfileUpdate::Email(email) => self.change_email(identity, &email).await,
        }
    }

    /// Move the caller's account to a new email address and send a login
    /// code there.
    ///
    /// # Errors
    ///
    /// - `InvalidEmail` if the address is malformed or its domain does not resolve
    /// - `AlreadyInUse` if another account holds the address
    /// - `UserNotFound` if the account is gone or deregistered
    /// - `ServiceUnavailable` if a backend is unreachable
    #[tracing::instrument(skip_all, fields(public_id = %identity.public_id))]
    pub async fn change_email(&self, identity: &Identity, email: &str) -> Result<()> {
        let email = self.checked_email(email).await?;
        let user_id = self.obfuscator.decode(identity.public_id)?;

        self.users.update_email(user_id, &email).await?;
        self.verification.issue_code(&email, Operation::Login).await?;

        tracing::info!(user_id = user_id.0, "Email changed");

        Ok(())
    }

    /// Presigned URL the caller can upload the object named `checksum` to.
    ///
    /// # Errors
    ///
    /// - `Validation` if the checksum is blank or not a plain token
    /// - `ServiceUnavailable` if the store cannot sign
    #[tracing::instrument(skip_all, fields(public_id = %identity.public_id))]
    pub async fn upload_url(&self, identity: &Identity, checksum: &str) -> Result<String> {
        let checksum = checksum.trim();
        if checksum.is_empty() {
            return Err(AuthError::Validation("checksum must not be empty".to_string()));
        }
        if checksum.len() > MAX_CHECKSUM_LENGTH
            || !checksum
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        {
            return Err(AuthError::Validation("malformed checksum".to_string()));
        }

        let upload = &self.config.upload;
        self.storage
            .presigned_put_url(&upload.bucket, checksum, upload.url_ttl)
            .await
            .map_err(|e| match e {
                AuthError::ServiceUnavailable(_) => e,
                other => AuthError::ServiceUnavailable(other.to_string()),
            })
    }

    /// Normalize, then validate syntax and (if enabled) the domain.
    async fn checked_email(&self, email: &str) -> Result<String> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }

        let verification = &self.config.verification;
        if verification.verify_email_domain
            && !domain_resolves(&email, verification.domain_lookup_timeout).await
        {
            return Err(AuthError::InvalidEmail);
        }

        Ok(email)
    }

    /// Create or re-activate the user for `email`.
    async fn register(&self, email: &str, alias: Option<&str>) -> Result<UserId> {
        let alias = alias
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
            .ok_or(AuthError::EmptyAlias)?;
        if alias.chars().count() > MAX_NAME_LENGTH {
            return Err(AuthError::Validation(format!(
                "alias must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        let username = self.available_username(email).await?;

        let user_id = self
            .users
            .upsert(&NewUser {
                email: email.to_string(),
                username,
                alias: alias.to_string(),
            })
            .await?;

        tracing::info!(user_id = user_id.0, "User registered");

        Ok(user_id)
    }

    /// Username derived from `email`, or a random one if that is taken.
    ///
    /// A concurrent registration can still claim the name between this check
    /// and the insert; the insert then fails with `AlreadyInUse`.
    async fn available_username(&self, email: &str) -> Result<String> {
        if let Some(candidate) = username_from_email(email) {
            if !self.users.username_taken(&candidate).await? {
                return Ok(candidate);
            }
        }
        Ok(random_username())
    }

    async fn active_user(&self, identity: &Identity) -> Result<crate::providers::User> {
        let user_id = self.obfuscator.decode(identity.public_id)?;
        self.users
            .find_by_id(user_id)
            .await?
            .filter(|user| !user.deregistered)
            .ok_or(AuthError::UserNotFound)
    }

    async fn issue_session(&self, user_id: UserId) -> Result<TokenPair> {
        let public_id = self.obfuscator.encode(user_id)?;
        let pair = self.credentials.create_credentials(public_id)?;
        self.sessions.cache(&pair, public_id).await?;
        Ok(pair.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;
    use crate::config::{CredentialConfig, VerificationConfig};
    use crate::mocks::{MockCache, MockEmailProvider, MockStorageProvider, MockUserRepository};
    use crate::state::PublicUserId;

    type TestService =
        AuthService<MockCache, MockUserRepository, MockEmailProvider, MockStorageProvider>;

    struct Harness {
        service: TestService,
        cache: MockCache,
        users: MockUserRepository,
        email: MockEmailProvider,
        storage: MockStorageProvider,
    }

    fn harness() -> Harness {
        let cache = MockCache::new();
        let users = MockUserRepository::new();
        let email = MockEmailProvider::new();
        let storage = MockStorageProvider::new();
        let config = AuthConfig::new(CredentialConfig::new("access-secret", "refresh-secret"))
            .with_verification(VerificationConfig::default().with_domain_check(false));

        let service = AuthService::new(AuthEnvironment::new(
            cache.clone(),
            users.clone(),
            email.clone(),
            storage.clone(),
            config,
        ));

        Harness {
            service,
            cache,
            users,
            email,
            storage,
        }
    }

    impl Harness {
        async fn register(&self, email: &str, alias: &str) -> TokenPair {
            self.service.sign_up(email).await.unwrap();
            let code = self.email.last_code_for(email).unwrap();
            self.service
                .sign_in(&code, "register", Some(alias))
                .await
                .unwrap()
        }

        async fn identity(&self, pair: &TokenPair) -> Identity {
            let header = format!("Bearer {}", pair.access_token);
            self.service
                .authenticator()
                .authenticate(Some(&header))
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_sign_up_tags_operation_by_account_state() {
        let h = harness();

        assert_eq!(h.service.sign_up(" A@Example.com ").await.unwrap(), Operation::Register);
        let sent = h.email.last_to("a@example.com").unwrap();
        assert_eq!(sent.subject, "Finish creating your account");

        h.register("b@example.com", "Bo").await;
        assert_eq!(h.service.sign_up("b@example.com").await.unwrap(), Operation::Login);
        assert_eq!(h.email.last_to("b@example.com").unwrap().subject, "Sign in");
    }

    #[tokio::test]
    async fn test_sign_up_rejects_bad_email() {
        let h = harness();
        assert_eq!(h.service.sign_up("not-an-email").await, Err(AuthError::InvalidEmail));
        assert!(h.email.sent().is_empty());
    }

    #[tokio::test]
    async fn test_register_derives_username() {
        let h = harness();
        let pair = h.register("a@example.com", "Al").await;
        let identity = h.identity(&pair).await;

        let profile = h.service.get_profile(&identity).await.unwrap();
        assert_eq!(profile.username, "a");
        assert_eq!(profile.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_taken_username_falls_back_to_random() {
        let h = harness();
        h.register("a@example.com", "Al").await;
        let pair = h.register("a@other.example", "Al").await;

        let profile = h.service.get_profile(&h.identity(&pair).await).await.unwrap();
        assert_ne!(profile.username, "a");
        assert_eq!(profile.username.len(), 12);
    }

    #[tokio::test]
    async fn test_register_requires_alias() {
        let h = harness();
        h.service.sign_up("a@example.com").await.unwrap();
        let code = h.email.last_code_for("a@example.com").unwrap();

        assert_eq!(
            h.service.sign_in(&code, "register", Some("   ")).await,
            Err(AuthError::EmptyAlias)
        );
        assert_eq!(h.users.count(), 0);
    }

    #[tokio::test]
    async fn test_operation_mismatch_consumes_code() {
        let h = harness();
        h.register("a@example.com", "Al").await;
        h.service.sign_up("a@example.com").await.unwrap();
        let code = h.email.last_code_for("a@example.com").unwrap();

        assert_eq!(
            h.service.sign_in(&code, "register", None).await,
            Err(AuthError::InvalidOperation)
        );
        assert_eq!(
            h.service.sign_in(&code, "login", None).await,
            Err(AuthError::CodeExpired)
        );
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let h = harness();
        assert_eq!(
            h.service.sign_in("abcdefghijkl", "delete", None).await,
            Err(AuthError::InvalidOperation)
        );
    }

    #[tokio::test]
    async fn test_login_for_vanished_user() {
        let h = harness();
        let pair = h.register("a@example.com", "Al").await;
        h.service.sign_up("a@example.com").await.unwrap();
        let code = h.email.last_code_for("a@example.com").unwrap();

        let identity = h.identity(&pair).await;
        h.service.sign_out(&identity, true).await.unwrap();

        assert_eq!(
            h.service.sign_in(&code, "login", None).await,
            Err(AuthError::UserNotFound)
        );
    }

    #[tokio::test]
    async fn test_refresh_rotates_pair() {
        let h = harness();
        let pair = h.register("a@example.com", "Al").await;
        let before = h.identity(&pair).await;

        let next = h.service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(next, pair);

        assert_eq!(h.service.refresh(&pair.refresh_token).await, Err(AuthError::Unauthorized));
        let old = format!("Bearer {}", pair.access_token);
        assert_eq!(
            h.service.authenticator().authenticate(Some(&old)).await,
            Err(AuthError::Unauthorized)
        );

        let after = h.identity(&next).await;
        assert_eq!(after.public_id, before.public_id);
        assert_ne!(after.session_id, before.session_id);
    }

    #[tokio::test]
    async fn test_refresh_tolerates_expired_access_session() {
        let h = harness();
        let pair = h.register("a@example.com", "Al").await;
        let identity = h.identity(&pair).await;
        h.cache
            .expire(&format!("{}{}", crate::constants::keys::SESSION, identity.session_id));

        assert!(h.service.refresh(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_out_revokes_pair() {
        let h = harness();
        let pair = h.register("a@example.com", "Al").await;
        let identity = h.identity(&pair).await;

        h.service.sign_out(&identity, false).await.unwrap();

        assert!(h.cache.is_empty());
        assert_eq!(h.service.refresh(&pair.refresh_token).await, Err(AuthError::Unauthorized));
        assert_eq!(
            h.service.sign_out(&identity, false).await,
            Err(AuthError::AlreadyExpired)
        );
    }

    #[tokio::test]
    async fn test_deregister_then_reregister() {
        let h = harness();
        let pair = h.register("a@example.com", "Al").await;
        let identity = h.identity(&pair).await;

        h.service.sign_out(&identity, true).await.unwrap();
        assert!(h.users.by_email("a@example.com").unwrap().deregistered);

        assert_eq!(h.service.sign_up("a@example.com").await.unwrap(), Operation::Register);
        let again = h.register("a@example.com", "Ally").await;
        assert_eq!(h.identity(&again).await.public_id, identity.public_id);
        assert_eq!(h.users.count(), 1);
    }

    #[tokio::test]
    async fn test_deregister_twice_from_separate_sessions() {
        let h = harness();
        let first = h.register("a@example.com", "Al").await;
        let first = h.identity(&first).await;

        h.service.sign_up("a@example.com").await.unwrap();
        let code = h.email.last_code_for("a@example.com").unwrap();
        let second = h.service.sign_in(&code, "login", None).await.unwrap();
        let second = h.identity(&second).await;

        h.service.sign_out(&first, true).await.unwrap();

        assert_eq!(
            h.service.sign_out(&second, true).await,
            Err(AuthError::AlreadyDeregistered)
        );
        // The second session is still revoked.
        assert!(!h.service.sessions.exists(&second.session_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_username_conflict() {
        let h = harness();
        h.register("a@example.com", "Al").await;
        let pair = h.register("b@example.com", "Bo").await;
        let identity = h.identity(&pair).await;

        assert_eq!(
            h.service
                .update_profile(&identity, ProfileUpdate::Username("a".into()))
                .await,
            Err(AuthError::AlreadyInUse(crate::error::ConflictField::Username))
        );
        assert!(matches!(
            h.service
                .update_profile(&identity, ProfileUpdate::Username("no spaces".into()))
                .await,
            Err(AuthError::Validation(_))
        ));

        h.service
            .update_profile(&identity, ProfileUpdate::Username("bobby".into()))
            .await
            .unwrap();
        assert_eq!(h.service.get_profile(&identity).await.unwrap().username, "bobby");
    }

    #[tokio::test]
    async fn test_change_email_sends_login_code() {
        let h = harness();
        let pair = h.register("a@example.com", "Al").await;
        let identity = h.identity(&pair).await;

        h.service
            .update_profile(&identity, ProfileUpdate::Email("New@Example.com".into()))
            .await
            .unwrap();

        let profile = h.service.get_profile(&identity).await.unwrap();
        assert_eq!(profile.email, "new@example.com");

        let sent = h.email.last_to("new@example.com").unwrap();
        assert_eq!(sent.operation().as_deref(), Some("login"));
        assert!(h.service.sign_in(&sent.code().unwrap(), "login", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_upload_url() {
        let h = harness();
        let pair = h.register("a@example.com", "Al").await;
        let identity = h.identity(&pair).await;

        let url = h.service.upload_url(&identity, "abc123").await.unwrap();
        assert_eq!(url, "https://storage.test/all/abc123?expires=300");

        assert!(matches!(
            h.service.upload_url(&identity, "  ").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            h.service.upload_url(&identity, "../etc").await,
            Err(AuthError::Validation(_))
        ));

        h.storage.set_failing(true);
        assert!(matches!(
            h.service.upload_url(&identity, "abc123").await,
            Err(AuthError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_domain_identity() {
        let h = harness();
        let identity = Identity {
            public_id: PublicUserId(u32::MAX),
            session_id: SessionId::new_access(),
        };

        assert!(matches!(
            h.service.get_profile(&identity).await,
            Err(AuthError::OutOfRange(_))
        ));
    }
}
