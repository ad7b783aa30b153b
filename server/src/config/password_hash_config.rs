use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};

/// Argon2id work factor. Fixed for the lifetime of the process; stored
/// hashes carry their own parameters so changing these only affects new
/// accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHashConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl PasswordHashConfig {
    pub fn validate(&self) -> Result<()> {
        argon2::Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map(|_| ())
            .map_err(|e| ServerError::Configuration(format!("Invalid password_hash settings: {e}")))
    }
}
