//! Utility functions for authentication.
//!
//! Email normalization and validation, username derivation and random string
//! generation for codes and fallback usernames.

use crate::constants::users::{
    MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MIN_EMAIL_LENGTH, RANDOM_USERNAME_ALPHABET,
    RANDOM_USERNAME_LENGTH,
};
use crate::constants::verification::{CODE_ALPHABET, CODE_LENGTH};
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// Port used for the domain lookup. Only resolution matters, nothing connects.
const SMTP_PORT: u16 = 25;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .ok()
});

/// Trim and lowercase an email address.
///
/// # Examples
///
/// ```
/// use orchid_auth::utils::normalize_email;
///
/// assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email address syntax.
///
/// Checks the total length (3 to 254 characters) and matches the address
/// against an RFC 5322 style pattern. Callers normalize first.
///
/// # Examples
///
/// ```
/// use orchid_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("a@example.com"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("a@-example.com"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let len = email.len();
    if !(MIN_EMAIL_LENGTH..=MAX_EMAIL_LENGTH).contains(&len) {
        return false;
    }

    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

/// Whether the domain part of `email` resolves, bounded by `timeout`.
///
/// This is an address (A/AAAA) lookup through the system resolver, not an MX
/// query. Domains that only publish MX records are rejected, and domains with
/// an address but no mail exchanger pass.
///
/// A lookup that errors or times out counts as not resolving.
pub async fn domain_resolves(email: &str, timeout: Duration) -> bool {
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };

    match tokio::time::timeout(timeout, tokio::net::lookup_host((domain, SMTP_PORT))).await {
        Ok(Ok(mut addrs)) => addrs.next().is_some(),
        Ok(Err(e)) => {
            tracing::debug!(domain, error = %e, "Email domain did not resolve");
            false
        }
        Err(_) => {
            tracing::warn!(domain, ?timeout, "Email domain lookup timed out");
            false
        }
    }
}

/// Derive a username candidate from the local part of `email`.
///
/// Keeps `[a-z0-9._-]`, lowercased, truncated to the column width. Returns
/// `None` if nothing usable remains.
///
/// # Examples
///
/// ```
/// use orchid_auth::utils::username_from_email;
///
/// assert_eq!(username_from_email("a@example.com").as_deref(), Some("a"));
/// assert_eq!(username_from_email("Jo+tag@example.com").as_deref(), Some("jotag"));
/// assert_eq!(username_from_email("++@example.com"), None);
/// ```
#[must_use]
pub fn username_from_email(email: &str) -> Option<String> {
    let local = email.split('@').next().unwrap_or_default();

    let username: String = local
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
        .take(MAX_NAME_LENGTH)
        .collect();

    (!username.is_empty()).then_some(username)
}

/// Whether `username` is acceptable for a profile update.
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= MAX_NAME_LENGTH
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Random lowercase username used when the derived one is taken.
#[must_use]
pub fn random_username() -> String {
    random_string(RANDOM_USERNAME_ALPHABET, RANDOM_USERNAME_LENGTH)
}

/// Random verification code.
#[must_use]
pub fn random_code() -> String {
    random_string(CODE_ALPHABET, CODE_LENGTH)
}

fn random_string(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("a@b"));
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co.uk"));
        assert!(is_valid_email("o'brien@example.ie"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("a@example-.com"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn test_email_length_limits() {
        let label = "a".repeat(60);
        let domain = format!("{label}.{label}.{label}.{label}.com");
        let local = "x".repeat(MAX_EMAIL_LENGTH - domain.len() - 1);

        let at_limit = format!("{local}@{domain}");
        assert_eq!(at_limit.len(), MAX_EMAIL_LENGTH);
        assert!(is_valid_email(&at_limit));

        let over = format!("x{at_limit}");
        assert!(!is_valid_email(&over));
    }

    #[test]
    fn test_username_derivation_truncates() {
        let email = format!("{}@example.com", "Ab".repeat(40));
        let username = username_from_email(&email).unwrap_or_default();

        assert_eq!(username.len(), MAX_NAME_LENGTH);
        assert!(username.chars().all(|c| c == 'a' || c == 'b'));
    }

    #[test]
    fn test_username_validation() {
        assert!(is_valid_username("alice_01"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"x".repeat(MAX_NAME_LENGTH + 1)));
    }

    #[test]
    fn test_random_strings_use_alphabets() {
        let code = random_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));

        let username = random_username();
        assert_eq!(username.len(), RANDOM_USERNAME_LENGTH);
        assert!(username.bytes().all(|b| b.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_domain_resolves_rejects_missing_domain() {
        assert!(!domain_resolves("nobody", Duration::from_millis(100)).await);
    }
}
