//! # Core Runtime
//!
//! Shared runtime services for the auto-save engine:
//!
//! - **Configuration** (`config`): the JSON config file model (accounts,
//!   mirror tasks, magic regex presets, tuning knobs) with load/save and
//!   one-time default filling.
//! - **Logging** (`logging`): tracing subscriber bootstrap.
//! - **Notifications** (`notify`): per-account notification channels
//!   behind the `Notifier` trait.

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;

pub use config::{AccountConfig, Config, EmbyConfig, MagicEntry, TaskConfig, Tuning};
pub use error::{Result, RuntimeError};
pub use notify::Notifier;
