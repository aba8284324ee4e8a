//! Credential verification: argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`), so the
//! parameters used at hash time travel with the hash and `verify_password`
//! needs nothing but the candidate password.

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use thiserror::Error;

/// Work factor for password hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Number of argon2 passes (time cost).
    pub iterations: u32,
    /// Memory cost in KiB.
    pub memory_kib: u32,
}

impl HashCost {
    pub const fn new(iterations: u32, memory_kib: u32) -> Self {
        Self {
            iterations,
            memory_kib,
        }
    }
}

impl Default for HashCost {
    fn default() -> Self {
        Self::new(Params::DEFAULT_T_COST, Params::DEFAULT_M_COST)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("invalid hash cost: {0}")]
    InvalidCost(String),

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Hash `password` with a fresh random salt.
///
/// Two calls with the same input produce different strings; both verify.
pub fn hash_password(password: &str, cost: HashCost) -> Result<String, PasswordError> {
    let params = Params::new(cost.memory_kib, cost.iterations, Params::DEFAULT_P_COST, None)
        .map_err(|e| PasswordError::InvalidCost(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Returns `true` iff `hash` was produced from `password`.
///
/// A malformed hash is a mismatch, never an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
