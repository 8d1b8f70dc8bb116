//! Quark drive provider.
//!
//! Implements the engine's [`DriveGateway`](core_sync::DriveGateway)
//! against the Quark cloud-drive HTTP API: credential extraction from
//! the raw cookie, share resolution, paginated listings, the asynchronous
//! copy flow and the recycle-bin cleanup endpoints.

pub mod client;
pub mod credential;
pub mod error;
mod types;

pub use client::{parse_share_url, QuarkClient, ShareUrlParts};
pub use credential::{MobileParams, QuarkCredential};
pub use error::{QuarkError, Result};
