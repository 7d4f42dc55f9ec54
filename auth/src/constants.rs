//! Authentication constants.
//!
//! Fixed values shared across the verification, credential and session
//! components. Tunable lifetimes live in [`crate::config`].

/// Cache key prefixes. All keys share one logical namespace.
pub mod keys {
    /// `code -> "operation:email"`
    pub const VERIFICATION_CODE: &str = "auth:verification_code:";

    /// `email -> code`
    pub const VERIFICATION_EMAIL: &str = "auth:verification_email:";

    /// `session id -> public user id`
    pub const SESSION: &str = "auth:session:";
}

/// Verification code shape.
pub mod verification {
    /// Length of every issued code.
    pub const CODE_LENGTH: usize = 12;

    /// Alphabet codes are drawn from.
    pub const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

    /// Separator between operation and email in the stored value.
    pub const VALUE_SEPARATOR: char = ':';
}

/// Credential shape.
pub mod credentials {
    /// Joins the access session id and public user id into the refresh session id.
    pub const REFRESH_ID_SEPARATOR: &str = "++";

    /// Authorization scheme accepted by the middleware.
    pub const BEARER_SCHEME: &str = "Bearer";
}

/// User row limits.
pub mod users {
    /// `VARCHAR(50)` on `username` and `alias`.
    pub const MAX_NAME_LENGTH: usize = 50;

    /// Length of generated fallback usernames.
    pub const RANDOM_USERNAME_LENGTH: usize = 12;

    /// Alphabet for generated fallback usernames.
    pub const RANDOM_USERNAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

    /// Shortest accepted email, `a@b`.
    pub const MIN_EMAIL_LENGTH: usize = 3;

    /// Longest accepted email.
    pub const MAX_EMAIL_LENGTH: usize = 254;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefixes_are_distinct() {
        assert_ne!(keys::VERIFICATION_CODE, keys::VERIFICATION_EMAIL);
        assert_ne!(keys::VERIFICATION_CODE, keys::SESSION);
        assert_ne!(keys::VERIFICATION_EMAIL, keys::SESSION);
    }

    #[test]
    fn test_code_alphabet_is_letters_only() {
        assert_eq!(verification::CODE_ALPHABET.len(), 52);
        assert!(verification::CODE_ALPHABET.iter().all(u8::is_ascii_alphabetic));
    }
}
