use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network counters unavailable: {0}")]
    Provider(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Username already exists: {0}")]
    AlreadyExists(String),

    /// Covers both an unknown username and a wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to hand back to a client. Internal failures are collapsed
    /// into a generic message and only logged in full.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::Validation(reason) => reason.clone(),
            ServerError::AlreadyExists(_) => "Username already exists".to_string(),
            ServerError::InvalidCredentials => "Invalid username or password".to_string(),
            ServerError::Provider(_) => "Network statistics are unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<argon2::password_hash::Error> for ServerError {
    fn from(e: argon2::password_hash::Error) -> Self {
        ServerError::PasswordHash(e.to_string())
    }
}
