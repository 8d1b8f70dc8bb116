//! Task lifecycle states.
//!
//! One sync attempt moves through a linear pipeline; the state is logged
//! at each transition so a run can be reconstructed from the log alone.

use std::fmt;

/// Lifecycle of one task within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    CheckingShare,
    Diffing,
    Saving,
    Polling,
    Cleaning,
    Renaming,
    Done,
    /// Not eligible today (schedule) or filtered by index.
    Skipped,
    /// Share confirmed invalid; the task is sidelined until re-enabled.
    Banned,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::CheckingShare => "checking-share",
            TaskState::Diffing => "diffing",
            TaskState::Saving => "saving",
            TaskState::Polling => "polling",
            TaskState::Cleaning => "cleaning",
            TaskState::Renaming => "renaming",
            TaskState::Done => "done",
            TaskState::Skipped => "skipped",
            TaskState::Banned => "banned",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TaskState::CheckingShare.to_string(), "checking-share");
        assert_eq!(TaskState::Done.to_string(), "done");
    }
}
