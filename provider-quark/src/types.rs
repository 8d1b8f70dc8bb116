//! Wire types for the Quark drive API.
//!
//! Every response shares the `{code, message, data, metadata}` envelope;
//! the payload under `data` varies per endpoint. Unknown fields are
//! ignored, absent optional fields default, so minor upstream additions
//! do not break deserialization.

use serde::Deserialize;

/// Common response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct Metadata {
    #[serde(rename = "_total", default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountData {
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GrowthData {
    #[serde(rename = "88VIP", default)]
    pub vip: bool,
    #[serde(default)]
    pub total_capacity: u64,
    #[serde(default)]
    pub cap_composition: CapComposition,
    #[serde(default)]
    pub cap_sign: CapSign,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct CapComposition {
    #[serde(default)]
    pub sign_reward: u64,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct CapSign {
    #[serde(default)]
    pub sign_daily: bool,
    #[serde(default)]
    pub sign_daily_reward: u64,
    #[serde(default)]
    pub sign_progress: u32,
    #[serde(default)]
    pub sign_target: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignData {
    #[serde(default)]
    pub sign_daily_reward: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenData {
    #[serde(default)]
    pub stoken: String,
}

/// `data.list` wrapper shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ListData<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShareFile {
    pub fid: String,
    pub file_name: String,
    #[serde(default)]
    pub dir: bool,
    #[serde(default)]
    pub obj_category: String,
    #[serde(default)]
    pub share_fid_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DriveFile {
    pub fid: String,
    pub file_name: String,
    #[serde(default)]
    pub dir: bool,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathEntry {
    pub file_path: String,
    pub fid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewDirData {
    pub fid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveData {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskData {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub task_title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecycleFile {
    pub record_id: String,
    pub fid: String,
}
