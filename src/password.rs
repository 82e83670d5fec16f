//! Password hashing and verification (bcrypt).

/// Work factor for new hashes. Raising it only affects newly stored
/// credentials; verification reads the cost from the hash itself.
pub const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Compare a plain password against a stored bcrypt hash.
///
/// Malformed hashes verify as `false` rather than erroring, so a corrupt
/// credential row behaves like a wrong password. The comparison itself is
/// constant-time inside the bcrypt primitive.
#[must_use]
pub fn verify(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}

/// Hash a password for storage.
///
/// # Errors
/// Returns an error if hashing fails (e.g. the OS RNG is unavailable).
pub fn hash(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, BCRYPT_COST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hashed = hash("P1").unwrap();
        assert!(verify("P1", &hashed));
        assert!(!verify("wrong", &hashed));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        assert!(!verify("P1", "not-a-bcrypt-hash"));
        assert!(!verify("P1", ""));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash("P1").unwrap();
        let second = hash("P1").unwrap();
        assert_ne!(first, second);
    }
}
