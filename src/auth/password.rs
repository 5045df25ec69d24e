use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::{ConfigError, PasswordConfig};

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The stored hash is not a PHC string we can parse. Distinct from a
    /// plain mismatch, which is `Ok(false)`.
    #[error("malformed password hash: {0}")]
    Format(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Argon2id hasher with a fixed work factor and a random salt per record.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Hash of a throwaway secret made with the live params. Checked on the
    /// unknown-account path so it costs as much as a real mismatch.
    decoy: String,
}

impl PasswordHasher {
    pub fn new(cfg: &PasswordConfig) -> Result<Self, ConfigError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| ConfigError::InvalidValue("HASH_*".into(), e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let decoy = argon2
            .hash_password(b"grindly-decoy-secret", &salt)
            .map_err(|e| ConfigError::InvalidValue("HASH_*".into(), e.to_string()))?
            .to_string();
        Ok(Self { argon2, decoy })
    }

    /// Pays for one verification against the decoy. Always false.
    pub fn verify_decoy(&self, plain: &str) -> bool {
        let _ = self.verify(plain, &self.decoy);
        false
    }

    pub fn hash(&self, plain: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                HashError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Parameters and salt are taken from the stored hash, so hashes made
    /// under an older work factor still verify.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            HashError::Format(e.to_string())
        })?;
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify error");
                Err(HashError::Format(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("test params are valid")
}
