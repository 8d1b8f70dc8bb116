//! Emby media-library provider.
//!
//! Implements the engine's [`MediaLibrary`](core_sync::MediaLibrary)
//! trait against an Emby server's REST API.

pub mod client;
pub mod error;

pub use client::EmbyClient;
pub use error::{EmbyError, Result};
