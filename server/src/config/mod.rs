mod password_hash_config;
mod server_config;

pub use password_hash_config::PasswordHashConfig;
pub use server_config::{CounterSource, ServerConfig};
