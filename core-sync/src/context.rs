//! Per-account run context.
//!
//! Replaces global mutable module state with an explicit value threaded
//! through the call chain: the directory-id cache, the aggregated
//! notification buffer and the tuning snapshot. One context lives for one
//! account's pass and is dropped afterwards, so nothing leaks across runs.

use core_runtime::config::Tuning;
use std::collections::HashMap;
use tracing::info;

/// Mutable state shared by all tasks of one account within a run.
///
/// Tasks execute sequentially, so a plain `&mut RunContext` is enough; the
/// cache is populated lazily and never invalidated mid-run (the run
/// assumes no concurrent writer on the destination tree).
pub struct RunContext {
    /// Normalized absolute path → directory id
    dir_cache: HashMap<String, String>,

    /// Ordered human-readable lines for the account's aggregated
    /// notification; cleared after dispatch
    notifications: Vec<String>,

    /// Tuning snapshot for this run
    pub tuning: Tuning,
}

impl RunContext {
    pub fn new(tuning: Tuning) -> Self {
        let mut dir_cache = HashMap::new();
        // The root always exists and is never created.
        dir_cache.insert("/".to_string(), "0".to_string());
        Self {
            dir_cache,
            notifications: Vec::new(),
            tuning,
        }
    }

    /// Look up a cached directory id.
    pub fn cached_fid(&self, path: &str) -> Option<&String> {
        self.dir_cache.get(path)
    }

    /// Record a resolved directory id.
    pub fn cache_fid(&mut self, path: String, fid: String) {
        self.dir_cache.insert(path, fid);
    }

    /// Append a line to the aggregated notification and log it.
    pub fn notify(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text.trim_end());
        self.notifications.push(text);
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    /// Drain the buffer into one aggregated body (flush-and-clear).
    pub fn take_notification_body(&mut self) -> String {
        let body = self.notifications.join("\n");
        self.notifications.clear();
        body
    }
}

/// Collapse duplicate slashes and force a leading slash.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    let mut prev_slash = true;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}
