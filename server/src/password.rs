use crate::config::PasswordHashConfig;
use crate::error::{Result, ServerError};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Argon2id hashing with a fixed work factor and a fresh salt per hash.
///
/// Output is a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
/// verification always uses the parameters the hash was created with.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(config: &PasswordHashConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| ServerError::Configuration(format!("Invalid password_hash settings: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) fn fast_config() -> PasswordHashConfig {
    PasswordHashConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}
