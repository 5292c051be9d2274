// ============================
// canary-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Params, Scrypt,
};

use super::token_generator::generate_secure_token_with_size;

/// scrypt hasher/verifier with fixed cost parameters
#[derive(Debug, Clone)]
pub struct PasswordVerifier {
    params: Params,
    /// Hash of a random secret nobody knows, checked when the user is unknown
    dummy_hash: String,
}

impl PasswordVerifier {
    /// Create a verifier hashing with `params`
    pub fn new(params: Params) -> anyhow::Result<Self> {
        let dummy_hash = hash_with(params, &generate_secure_token_with_size(16))?;
        Ok(Self { params, dummy_hash })
    }

    /// Hash a password with a fresh random salt
    pub fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        hash_with(self.params, plain)
    }

    /// Verify a password against a stored PHC hash. Unparseable hashes never match.
    pub fn verify_password(&self, hash: &str, plain: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }

    /// Spend the same work as a real verification without a real hash
    pub fn verify_dummy(&self, plain: &str) {
        let _ = self.verify_password(&self.dummy_hash, plain);
    }
}

fn hash_with(params: Params, plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)?
        .to_string();
    Ok(hash)
}
