pub mod api;
pub mod bandwidth;
pub mod config;
pub mod counters;
pub mod credential_store;
pub mod entity;
pub mod error;
pub mod password;
pub mod security;
pub mod server;
pub mod user_repository;

pub use error::{Result, ServerError};

/// Number of entries every history endpoint returns.
pub const RECENT_WINDOW: usize = 10;
