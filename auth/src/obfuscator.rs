//! Reversible obfuscation of user row ids.
//!
//! Row ids are sequential, so exposing them leaks sign-up volume and makes
//! neighbours guessable. Public ids are produced by a keyed permutation over
//! `[0, 2^31)`: multiply by a large prime modulo `2^31`, then XOR with a
//! random key. Decoding XORs the key back out and multiplies by the prime's
//! modular inverse.
//!
//! ```
//! use orchid_auth::obfuscator::IdentifierObfuscator;
//! use orchid_auth::state::UserId;
//!
//! let obfuscator = IdentifierObfuscator::default();
//! let public = obfuscator.encode(UserId(1)).unwrap();
//! assert_eq!(obfuscator.decode(public).unwrap(), UserId(1));
//! ```

use crate::error::{AuthError, Result};
use crate::state::{PublicUserId, UserId};

/// Exclusive upper bound of the id domain.
pub const DOMAIN_BOUND: u64 = 1 << 31;

const MASK: u64 = DOMAIN_BOUND - 1;

const DEFAULT_PRIME: u64 = 961_748_951;
const DEFAULT_INVERSE: u64 = 1_870_611_431;
const DEFAULT_XOR: u64 = 1_045_454_339;

/// Bijective permutation between row ids and public ids.
///
/// Stateless and deterministic: the same parameters give the same mapping
/// across restarts, so public ids stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierObfuscator {
    prime: u64,
    inverse: u64,
    xor: u64,
}

impl IdentifierObfuscator {
    /// Build from custom parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] unless `prime * inverse == 1 (mod 2^31)`
    /// and `xor < 2^31`.
    pub fn new(prime: u64, inverse: u64, xor: u64) -> Result<Self> {
        let prime = prime & MASK;
        let inverse = inverse & MASK;

        if prime.wrapping_mul(inverse) & MASK != 1 {
            return Err(AuthError::Internal(
                "obfuscator inverse does not invert prime modulo 2^31".to_string(),
            ));
        }
        if xor > MASK {
            return Err(AuthError::Internal(
                "obfuscator xor key outside id domain".to_string(),
            ));
        }

        Ok(Self {
            prime,
            inverse,
            xor,
        })
    }

    /// Obfuscate a row id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OutOfRange`] for negative ids.
    pub fn encode(&self, id: UserId) -> Result<PublicUserId> {
        let raw = u64::try_from(id.0).map_err(|_| AuthError::OutOfRange(i64::from(id.0)))?;
        let encoded = (raw.wrapping_mul(self.prime) & MASK) ^ self.xor;

        u32::try_from(encoded)
            .map(PublicUserId)
            .map_err(|_| AuthError::OutOfRange(i64::from(id.0)))
    }

    /// Recover the row id from a public id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OutOfRange`] for public ids `>= 2^31`.
    pub fn decode(&self, public_id: PublicUserId) -> Result<UserId> {
        let raw = u64::from(public_id.0);
        if raw > MASK {
            return Err(AuthError::OutOfRange(i64::from(public_id.0)));
        }

        let decoded = ((raw ^ self.xor).wrapping_mul(self.inverse)) & MASK;

        i32::try_from(decoded)
            .map(UserId)
            .map_err(|_| AuthError::OutOfRange(i64::from(public_id.0)))
    }
}

impl Default for IdentifierObfuscator {
    fn default() -> Self {
        Self {
            prime: DEFAULT_PRIME,
            inverse: DEFAULT_INVERSE,
            xor: DEFAULT_XOR,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_vectors() {
        let obfuscator = IdentifierObfuscator::default();

        assert_eq!(obfuscator.encode(UserId(0)).unwrap(), PublicUserId(1_045_454_339));
        assert_eq!(obfuscator.encode(UserId(1)).unwrap(), PublicUserId(117_653_972));
        assert_eq!(obfuscator.encode(UserId(12_345)).unwrap(), PublicUserId(1_730_820_316));
        assert_eq!(
            obfuscator.encode(UserId(i32::MAX)).unwrap(),
            PublicUserId(2_029_829_674)
        );
    }

    #[test]
    fn test_domain_edges_round_trip() {
        let obfuscator = IdentifierObfuscator::default();

        for id in [0, 1, 2, i32::MAX - 1, i32::MAX] {
            let public = obfuscator.encode(UserId(id)).unwrap();
            assert_eq!(obfuscator.decode(public).unwrap(), UserId(id));
        }
    }

    #[test]
    fn test_out_of_range_inputs_rejected() {
        let obfuscator = IdentifierObfuscator::default();

        assert_eq!(
            obfuscator.encode(UserId(-1)),
            Err(AuthError::OutOfRange(-1))
        );
        assert_eq!(
            obfuscator.decode(PublicUserId(1 << 31)),
            Err(AuthError::OutOfRange(1 << 31))
        );
        assert!(obfuscator.decode(PublicUserId(u32::MAX)).is_err());
    }

    #[test]
    fn test_sequential_ids_do_not_collide() {
        let obfuscator = IdentifierObfuscator::default();

        let encoded: HashSet<u32> = (0..100_000)
            .map(|id| obfuscator.encode(UserId(id)).unwrap().0)
            .collect();

        assert_eq!(encoded.len(), 100_000);
    }

    #[test]
    fn test_sequential_ids_are_not_sequential_publicly() {
        let obfuscator = IdentifierObfuscator::default();

        let a = obfuscator.encode(UserId(41)).unwrap().0;
        let b = obfuscator.encode(UserId(42)).unwrap().0;

        assert_ne!(a.abs_diff(b), 1);
    }

    #[test]
    fn test_custom_parameters_validated() {
        assert!(IdentifierObfuscator::new(DEFAULT_PRIME, DEFAULT_INVERSE, DEFAULT_XOR).is_ok());
        assert!(IdentifierObfuscator::new(DEFAULT_PRIME, DEFAULT_INVERSE + 2, DEFAULT_XOR).is_err());
        assert!(IdentifierObfuscator::new(DEFAULT_PRIME, DEFAULT_INVERSE, DOMAIN_BOUND).is_err());
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(id in 0..=i32::MAX) {
            let obfuscator = IdentifierObfuscator::default();
            let public = obfuscator.encode(UserId(id)).unwrap();

            prop_assert!(u64::from(public.0) < DOMAIN_BOUND);
            prop_assert_eq!(obfuscator.decode(public).unwrap(), UserId(id));
        }

        #[test]
        fn prop_encode_inverts_decode(public in 0..(1u32 << 31)) {
            let obfuscator = IdentifierObfuscator::default();
            let id = obfuscator.decode(PublicUserId(public)).unwrap();

            prop_assert_eq!(obfuscator.encode(id).unwrap(), PublicUserId(public));
        }

        #[test]
        fn prop_distinct_ids_encode_distinctly(a in 0..=i32::MAX, b in 0..=i32::MAX) {
            prop_assume!(a != b);
            let obfuscator = IdentifierObfuscator::default();

            prop_assert_ne!(
                obfuscator.encode(UserId(a)).unwrap(),
                obfuscator.encode(UserId(b)).unwrap()
            );
        }
    }
}
