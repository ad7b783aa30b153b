use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}
