//! # Configuration Model
//!
//! Typed model of the JSON config file: accounts with their ordered task
//! lists, magic regex presets, the media-library endpoint and tuning
//! knobs. The engine reads the full set at run start and writes back only
//! task-level mutations (ban reason, discovered library id) at run end.
//!
//! Records are tagged structs with explicit optional fields; defaults that
//! older config files may lack are filled once at load time by
//! [`Config::fill_defaults`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Default preset installed under the `$TV` magic keyword.
const TV_PATTERN: &str = r".*?(S\d{1,2}E)?P?(\d{1,3}).*?\.(mp4|mkv)";
const TV_REPLACE: &str = "$1$2.$3";

/// One mirror relationship between a share and a destination path.
///
/// Identity is the position in the owning account's `tasklist`. The engine
/// mutates only `shareurl_ban` and `emby_id`; everything else belongs to
/// the admin collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Display name, also used to search the media library
    pub taskname: String,

    /// Share URL (`https://pan.quark.cn/s/<id>`, optional subfolder fragment)
    pub shareurl: String,

    /// Destination path in the account's own tree
    pub savepath: String,

    /// Rename pattern (regex or magic keyword such as `$TV`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Rename replacement template (`$1`-style backreferences)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,

    /// Compare names with extensions stripped
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore_extension: bool,

    /// Last day (inclusive, `YYYY-MM-DD`) the task is eligible to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enddate: Option<String>,

    /// ISO weekdays (1 = Monday … 7 = Sunday) the task runs on; empty = daily
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runweek: Vec<u8>,

    /// Stop marker: share listing is processed up to and including this fid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startfid: Option<String>,

    /// Pattern applied to subdirectory names; presence enables recursion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_subdir: Option<String>,

    /// Media library item id; `"0"` disables refresh, absent = discover
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emby_id: Option<String>,

    /// Reason the share became unresolvable; set once by the engine, task
    /// is skipped until manually edited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shareurl_ban: Option<String>,
}

/// One account: credential cookie, its ordered tasks and notification
/// endpoints. The credential is an opaque bearer token supplied externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Display name
    pub name: String,

    /// Raw cookie string; session/mobile parameters are extracted from it
    pub cookie: String,

    /// Ordered mirror tasks
    #[serde(default)]
    pub tasklist: Vec<TaskConfig>,

    /// Telegram bot token for notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tg_bot_token: Option<String>,

    /// Telegram chat id for notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tg_user_id: Option<String>,

    /// DingTalk robot webhook access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dd_bot_token: Option<String>,
}

/// Magic regex preset: keyword → pattern/replace pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MagicEntry {
    pub pattern: String,
    pub replace: String,
}

/// Media library (Emby) endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbyConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub apikey: String,
}

/// Tuning knobs for provider-behavior constants.
///
/// The defaults preserve the provider's currently observed limits; they
/// are configuration, not invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Listing page size
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Paths per batched directory-id lookup
    #[serde(default = "default_path_batch")]
    pub path_batch: usize,

    /// Delay between copy-task polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for a pending copy task after this many seconds
    #[serde(default = "default_poll_ceiling_secs")]
    pub poll_ceiling_secs: u64,

    /// Recency window for duplicate-save cleanup, in seconds
    #[serde(default = "default_dup_window_secs")]
    pub dup_window_secs: i64,
}

fn default_page_size() -> u32 {
    50
}
fn default_path_batch() -> usize {
    50
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_poll_ceiling_secs() -> u64 {
    60
}
fn default_dup_window_secs() -> i64 {
    60
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            path_batch: default_path_batch(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_ceiling_secs: default_poll_ceiling_secs(),
            dup_window_secs: default_dup_window_secs(),
        }
    }
}

/// Full config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Accounts, each owning its tasks (key name kept for file compatibility)
    #[serde(rename = "cookies", default)]
    pub accounts: Vec<AccountConfig>,

    /// Magic regex presets
    #[serde(default)]
    pub magic_regex: HashMap<String, MagicEntry>,

    /// Media library endpoint
    #[serde(default)]
    pub emby: EmbyConfig,

    /// Provider-behavior constants
    #[serde(default)]
    pub tuning: Tuning,
}

impl Config {
    /// Load the config from a JSON file and fill missing defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&raw)?;
        config.fill_defaults();
        Ok(config)
    }

    /// Persist the config, including engine-made task mutations.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// One-time default-fill migration for fields older files may lack.
    pub fn fill_defaults(&mut self) {
        self.magic_regex
            .entry("$TV".to_string())
            .or_insert_with(|| MagicEntry {
                pattern: TV_PATTERN.to_string(),
                replace: TV_REPLACE.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "cookies": [
                {
                    "name": "main",
                    "cookie": "__uid=abc; __puus=def",
                    "tasklist": [
                        {
                            "taskname": "Some Show",
                            "shareurl": "https://pan.quark.cn/s/abcd1234",
                            "savepath": "/tv/some-show",
                            "pattern": "$TV",
                            "replace": "",
                            "runweek": [1, 3, 5]
                        }
                    ]
                }
            ],
            "emby": { "url": "http://emby.local:8096", "apikey": "k" }
        }"#
    }

    #[test]
    fn test_parse_and_fill_defaults() {
        let mut config: Config = serde_json::from_str(sample_json()).unwrap();
        config.fill_defaults();

        assert_eq!(config.accounts.len(), 1);
        let task = &config.accounts[0].tasklist[0];
        assert_eq!(task.taskname, "Some Show");
        assert_eq!(task.runweek, vec![1, 3, 5]);
        assert!(!task.ignore_extension);
        assert!(task.shareurl_ban.is_none());

        // $TV preset installed by migration
        assert!(config.magic_regex.contains_key("$TV"));
        // tuning falls back to provider defaults
        assert_eq!(config.tuning.page_size, 50);
        assert_eq!(config.tuning.dup_window_secs, 60);
    }

    #[test]
    fn test_tv_preset_content() {
        let mut config = Config::default();
        config.fill_defaults();

        let preset = &config.magic_regex["$TV"];
        assert_eq!(preset.pattern, TV_PATTERN);
        assert_eq!(preset.replace, TV_REPLACE);
    }

    #[test]
    fn test_save_load_round_trip_keeps_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config: Config = serde_json::from_str(sample_json()).unwrap();
        config.fill_defaults();
        config.accounts[0].tasklist[0].shareurl_ban = Some("share link expired".to_string());
        config.accounts[0].tasklist[0].emby_id = Some("42".to_string());
        config.save(&path).unwrap();

        let reloaded = Config::load(&path).unwrap();
        let task = &reloaded.accounts[0].tasklist[0];
        assert_eq!(task.shareurl_ban.as_deref(), Some("share link expired"));
        assert_eq!(task.emby_id.as_deref(), Some("42"));
    }
}
