use core_sync::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuarkError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] core_http::HttpError),

    /// Structured failure from the API envelope (`code != 0`).
    #[error("Quark API error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// The share link cannot be resolved anymore.
    #[error("{0}")]
    ShareInvalid(String),

    /// A 2xx response that was not the JSON we expected.
    #[error("Malformed Quark response: {0}")]
    Malformed(String),

    #[error("Response missing expected field: {0}")]
    MissingField(&'static str),

    #[error("Invalid credential: {0}")]
    Credential(String),
}

impl From<QuarkError> for SyncError {
    fn from(e: QuarkError) -> Self {
        match e {
            QuarkError::Http(inner) => SyncError::Transport(inner.to_string()),
            QuarkError::Api { code, message } => SyncError::Api { code, message },
            QuarkError::ShareInvalid(reason) => SyncError::ShareInvalid { reason },
            QuarkError::Malformed(detail) => SyncError::Parse(detail),
            QuarkError::MissingField(field) => SyncError::Parse(format!("missing field {field}")),
            QuarkError::Credential(detail) => SyncError::Transport(detail),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuarkError>;
