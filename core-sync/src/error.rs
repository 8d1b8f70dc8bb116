use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The share link is no longer resolvable (expired, deleted, access
    /// denied). Terminal for the task: recorded as its ban reason.
    #[error("{reason}")]
    ShareInvalid { reason: String },

    /// Structured failure reported by the drive API.
    #[error("Drive API error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// Network-level failure (unreachable, timeout, retries exhausted).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A well-formed response was missing an expected field. Indicates a
    /// provider contract change; allowed to abort the account's pass.
    #[error("Malformed API response: {0}")]
    Parse(String),

    #[error("Failed to create directory {path}: {reason}")]
    DirectoryCreate { path: String, reason: String },

    #[error("Copy task {task_id} still pending after {waited_secs}s")]
    PollCeiling { task_id: String, waited_secs: u64 },

    #[error("Invalid pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
