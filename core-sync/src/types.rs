//! Domain types shared between the engine and the provider gateways.

use serde::{Deserialize, Serialize};

/// A resolved share: the opaque share id, its session-scoped access token
/// and the subtree root to mirror from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShare {
    /// Share id extracted from the share URL
    pub pwd_id: String,
    /// Session-scoped access token ("stoken")
    pub stoken: String,
    /// Directory id inside the share to start from (`"0"` = share root)
    pub root_fid: String,
}

/// One entry of a share listing. Produced fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEntry {
    /// Remote id
    pub fid: String,
    /// Display name
    pub file_name: String,
    /// Whether the entry is a directory
    pub dir: bool,
    /// Content category reported by the provider (e.g. `"video"`)
    #[serde(default)]
    pub obj_category: String,
    /// Opaque token required to copy this specific entry
    #[serde(default)]
    pub share_fid_token: String,
}

/// One entry of a destination listing. Used for existence comparison and
/// duplicate cleanup only; not cached beyond one listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveEntry {
    pub fid: String,
    pub file_name: String,
    pub dir: bool,
    /// Creation timestamp, epoch seconds
    #[serde(default)]
    pub created_at: i64,
}

/// Destination path resolved to its directory id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFid {
    pub file_path: String,
    pub fid: String,
}

/// One recycle-bin record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecycleRecord {
    pub record_id: String,
    pub fid: String,
}

/// State of an asynchronous copy task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPoll {
    /// Provider status code; `0` = still pending
    pub status: i64,
    /// Human-readable task title, when reported
    pub title: String,
}

impl TaskPoll {
    pub fn is_pending(&self) -> bool {
        self.status == 0
    }
}

/// Basic account identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub nickname: String,
}

/// Capacity/growth snapshot used by the daily sign-in pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GrowthInfo {
    /// Premium-tier flag
    pub vip: bool,
    /// Total capacity, bytes
    pub total_capacity: u64,
    /// Capacity accumulated from sign-in rewards, bytes
    pub sign_reward: u64,
    /// Whether today's sign-in is already done
    pub signed_today: bool,
    /// Today's reward when already signed, bytes
    pub daily_reward: u64,
    /// Consecutive sign-in progress
    pub sign_progress: u32,
    /// Consecutive sign-in target
    pub sign_target: u32,
}
