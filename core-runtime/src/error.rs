use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Notification dispatch failed: {0}")]
    Notify(String),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
