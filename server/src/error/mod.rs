mod server_error;

pub use server_error::ServerError;
pub type Result<T> = std::result::Result<T, ServerError>;
