//! Authentication configuration.
//!
//! Configuration values are provided by the application, not hardcoded.
//! Every struct has sensible defaults and `with_*` builders; only the two
//! signing secrets have no usable default.

use chrono::Duration;
use std::fmt;

/// Token signing and lifetime configuration.
#[derive(Clone)]
pub struct CredentialConfig {
    /// HMAC secret for access tokens.
    pub access_secret: String,

    /// HMAC secret for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: String,

    /// Access token lifetime.
    ///
    /// Default: 15 minutes
    pub access_ttl: Duration,

    /// Refresh token lifetime.
    ///
    /// Default: 7 days
    pub refresh_ttl: Duration,
}

impl CredentialConfig {
    /// Create credential configuration with default lifetimes.
    #[must_use]
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }

    /// Set access token lifetime.
    #[must_use]
    pub const fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set refresh token lifetime.
    #[must_use]
    pub const fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Verification code configuration.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Callback page the emailed link points to.
    ///
    /// Links are formatted as `{callback_url}?token={code}&operation={op}&state={state}`.
    pub callback_url: String,

    /// Opaque `state` value echoed back by the callback page.
    pub state: String,

    /// Code lifetime.
    ///
    /// Default: 2 hours
    pub code_ttl: Duration,

    /// Whether sign-up resolves the email's domain before issuing a code.
    ///
    /// Default: true
    pub verify_email_domain: bool,

    /// Upper bound on the domain lookup.
    ///
    /// Default: 2 seconds
    pub domain_lookup_timeout: std::time::Duration,
}

impl VerificationConfig {
    /// Create verification configuration.
    #[must_use]
    pub fn new(callback_url: impl Into<String>) -> Self {
        Self {
            callback_url: callback_url.into(),
            ..Self::default()
        }
    }

    /// Set the callback `state` value.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Set code lifetime.
    #[must_use]
    pub const fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    /// Enable or disable the email domain lookup.
    #[must_use]
    pub const fn with_domain_check(mut self, enabled: bool) -> Self {
        self.verify_email_domain = enabled;
        self
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            callback_url: "http://localhost:3000/m/callback".to_string(),
            state: "orchid".to_string(),
            code_ttl: Duration::hours(2),
            verify_email_domain: true,
            domain_lookup_timeout: std::time::Duration::from_secs(2),
        }
    }
}

/// Presigned upload configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Bucket uploads go to.
    ///
    /// Default: `all`
    pub bucket: String,

    /// Presigned URL lifetime.
    ///
    /// Default: 5 minutes
    pub url_ttl: std::time::Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            bucket: "all".to_string(),
            url_ttl: std::time::Duration::from_secs(5 * 60),
        }
    }
}

/// HTTP surface configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Deadline for a whole request, including cache and database calls.
    ///
    /// Default: 10 seconds
    pub request_deadline: std::time::Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_deadline: std::time::Duration::from_secs(10),
        }
    }
}

/// Complete configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token signing and lifetimes.
    pub credentials: CredentialConfig,

    /// Verification codes and emails.
    pub verification: VerificationConfig,

    /// Presigned uploads.
    pub upload: UploadConfig,

    /// HTTP surface.
    pub http: HttpConfig,
}

impl AuthConfig {
    /// Create configuration with defaults for everything but the secrets.
    #[must_use]
    pub fn new(credentials: CredentialConfig) -> Self {
        Self {
            credentials,
            verification: VerificationConfig::default(),
            upload: UploadConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// Set verification configuration.
    #[must_use]
    pub fn with_verification(mut self, verification: VerificationConfig) -> Self {
        self.verification = verification;
        self
    }

    /// Set upload configuration.
    #[must_use]
    pub fn with_upload(mut self, upload: UploadConfig) -> Self {
        self.upload = upload;
        self
    }

    /// Set HTTP configuration.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }
}
