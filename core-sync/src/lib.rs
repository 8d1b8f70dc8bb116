//! Share mirroring engine.
//!
//! Everything between "a share URL and a destination path" and "the
//! destination mirrors the share" lives here: the per-level diff planner,
//! destination resolution with its directory-id cache, copy-task polling,
//! duplicate cleanup, the rename pass and the coordinator that strings
//! them together per account. The storage provider and the media library
//! are reached only through the [`DriveGateway`] and [`MediaLibrary`]
//! traits, so the engine itself never speaks HTTP.

pub mod cleanup;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod growth;
pub mod planner;
pub mod poller;
pub mod rename;
pub mod resolver;
pub mod schedule;
pub mod state;
pub mod tree;
pub mod types;

pub use context::{normalize_path, RunContext};
pub use coordinator::{SyncCoordinator, TaskOutcome};
pub use error::{Result, SyncError};
pub use gateway::{DriveGateway, MediaLibrary};
pub use planner::{DiffPolicy, PlannedSave, RecurseTarget, SavePlan};
pub use poller::{Sleeper, TokioSleeper};
pub use state::TaskState;
pub use tree::ReportTree;
pub use types::{
    AccountInfo, DriveEntry, GrowthInfo, PathFid, RecycleRecord, ResolvedShare, ShareEntry,
    TaskPoll,
};
