use core_sync::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbyError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] core_http::HttpError),

    #[error("Emby server answered status {0}")]
    Status(u16),

    #[error("Malformed Emby response: {0}")]
    Malformed(String),
}

impl From<EmbyError> for SyncError {
    fn from(e: EmbyError) -> Self {
        match e {
            EmbyError::Http(inner) => SyncError::Transport(inner.to_string()),
            EmbyError::Status(status) => SyncError::Transport(format!("Emby status {status}")),
            EmbyError::Malformed(detail) => SyncError::Parse(detail),
        }
    }
}

pub type Result<T> = std::result::Result<T, EmbyError>;
