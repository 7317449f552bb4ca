// ============================
// backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash,
        PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use super::AuthError;
use crate::config::ConfigError;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
    /// Digest length in bytes
    pub output_len: usize,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 1,
            parallelism: 2,
            output_len: 32,
        }
    }
}

impl HashParams {
    fn to_argon2(self) -> Result<Params, ConfigError> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| ConfigError::Hashing(e.to_string()))
    }
}

/// Argon2id password hasher
///
/// Holds only the immutable cost parameters, so it is cheap to clone and
/// safe to share between tasks.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash checked when there is no stored hash to compare against
    decoy: Arc<OnceLock<String>>,
    #[cfg(test)]
    verifications: Arc<AtomicUsize>,
}

/// Password behind the decoy hash; never matches a real account.
const DECOY_PASSWORD: &str = "passgate-decoy-password";

impl PasswordHasher {
    /// Build a hasher, rejecting parameters Argon2 would refuse at hash time.
    pub fn new(params: HashParams) -> Result<Self, ConfigError> {
        Ok(Self {
            params: params.to_argon2()?,
            decoy: Arc::default(),
            #[cfg(test)]
            verifications: Arc::default(),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Returns a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$digest`).
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored hash.
    ///
    /// `Ok(false)` means the password is wrong. [`AuthError::MalformedHash`]
    /// means the stored value is not an Argon2id PHC string, which points at
    /// corrupted data rather than a bad login.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::Relaxed);

        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::MalformedHash)?;
        if parsed.algorithm != argon2::ARGON2ID_IDENT {
            return Err(AuthError::MalformedHash);
        }

        // Cost parameters and salt come from the stored hash, not from `self`.
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(_) => Err(AuthError::MalformedHash),
        }
    }

    /// Spend the same Argon2 work as [`verify`](Self::verify) without a
    /// stored hash, so a login for an unknown account costs as much as one
    /// with a wrong password.
    pub fn verify_decoy(&self, password: &str) -> Result<(), AuthError> {
        self.warm_up()?;
        let decoy = self
            .decoy
            .get()
            .ok_or_else(|| AuthError::Hashing("decoy hash unavailable".to_string()))?;
        self.verify(password, decoy).map(|_| ())
    }

    /// Compute the decoy hash now instead of on the first unknown login.
    pub fn warm_up(&self) -> Result<(), AuthError> {
        if self.decoy.get().is_none() {
            let hash = self.hash(DECOY_PASSWORD)?;
            let _ = self.decoy.set(hash);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn verifications(&self) -> usize {
        self.verifications.load(Ordering::Relaxed)
    }
}
