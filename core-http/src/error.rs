use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("All {0} retry attempts exhausted")]
    RetriesExhausted(u32),
}

pub type Result<T> = std::result::Result<T, HttpError>;
