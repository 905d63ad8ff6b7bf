//! Salted, iterated password digest (PBKDF2-HMAC-SHA256).

use crate::model::user::PasswordDigest;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

/// Salt length before hex encoding.
const SALT_BYTES: usize = 16;

/// Derived key length before hex encoding (64 hex chars).
const DIGEST_BYTES: usize = 32;

/// Salt used for the timing-equalizing digest on unknown usernames.
const DUMMY_SALT: &str = "00000000000000000000000000000000";

/// Digests `password` under a fresh random salt.
pub fn digest_password(password: &str, iterations: u32) -> PasswordDigest {
    let salt = generate_salt();
    let hash = derive_hex(password, salt.as_str(), iterations);
    PasswordDigest {
        hash,
        salt,
        iterations,
    }
}

/// Returns whether `password` reproduces the stored digest.
///
/// Comparison is constant-time over the hex strings.
pub fn verify_password(password: &str, stored: &PasswordDigest) -> bool {
    if stored.iterations == 0 {
        return false;
    }
    let attempt = derive_hex(password, stored.salt.as_str(), stored.iterations);
    constant_time_eq(attempt.as_bytes(), stored.hash.as_bytes())
}

/// Spends the same work as a real verification and discards the result.
///
/// Used when the username does not exist, so both login failures cost the
/// same.
pub fn burn_dummy_digest(password: &str, iterations: u32) {
    let _ = derive_hex(password, DUMMY_SALT, iterations.max(1));
}

fn derive_hex(password: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0u8; DIGEST_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    hex::encode(key)
}

fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::{constant_time_eq, derive_hex, digest_password, verify_password, DIGEST_BYTES};

    const FAST_ITERATIONS: u32 = 16;

    #[test]
    fn digest_is_fixed_length_lowercase_hex() {
        let digest = digest_password("1234", FAST_ITERATIONS);
        assert_eq!(digest.hash.len(), DIGEST_BYTES * 2);
        assert!(digest
            .hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(digest.iterations, FAST_ITERATIONS);
    }

    #[test]
    fn same_password_gets_different_salts() {
        let first = digest_password("1234", FAST_ITERATIONS);
        let second = digest_password("1234", FAST_ITERATIONS);
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn derivation_is_deterministic_for_same_salt() {
        assert_eq!(
            derive_hex("secret", "abcd", FAST_ITERATIONS),
            derive_hex("secret", "abcd", FAST_ITERATIONS)
        );
        assert_ne!(
            derive_hex("secret", "abcd", FAST_ITERATIONS),
            derive_hex("secret", "abcd", FAST_ITERATIONS + 1)
        );
    }

    #[test]
    fn verify_accepts_only_the_original_password() {
        let digest = digest_password("correct horse", FAST_ITERATIONS);
        assert!(verify_password("correct horse", &digest));
        assert!(!verify_password("correct horsE", &digest));
        assert!(!verify_password("", &digest));
    }

    #[test]
    fn verify_rejects_zero_iteration_records() {
        let mut digest = digest_password("1234", FAST_ITERATIONS);
        digest.iterations = 0;
        assert!(!verify_password("1234", &digest));
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
