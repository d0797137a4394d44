//! One-way password hashing.
//!
//! Digests are Argon2id PHC strings, so each one carries its own random salt
//! and parameters; `verify_password` needs nothing but the stored digest.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use std::sync::LazyLock;

use crate::{EngineError, ResultEngine};

/// Digest checked when no user matches a login, so a miss costs the same
/// Argon2 work as a wrong password.
static DUMMY_DIGEST: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("no-such-user-placeholder").ok());

/// Hashes `plaintext` with a fresh random salt.
///
/// Fails with [`EngineError::EmptyInput`] when `plaintext` is empty.
pub fn hash_password(plaintext: &str) -> ResultEngine<String> {
    if plaintext.is_empty() {
        return Err(EngineError::EmptyInput(
            "password must not be empty".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|err| EngineError::Hashing(err.to_string()))
}

/// Checks `plaintext` against a digest produced by [`hash_password`].
///
/// Mismatches and unparsable digests both yield `false`.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Runs a full verification against a throwaway digest and discards it.
pub(crate) fn verify_dummy(plaintext: &str) {
    if let Some(digest) = DUMMY_DIGEST.as_deref() {
        let _ = verify_password(plaintext, digest);
    }
}
