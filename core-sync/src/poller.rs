//! Asynchronous copy-task polling.
//!
//! Saving share entries returns a task id; the provider materializes the
//! copy in the background. This module polls that task at a fixed
//! interval until it leaves the pending state or a wall-clock ceiling is
//! hit, with the clock injected so tests never sleep.

use crate::error::{Result, SyncError};
use crate::gateway::DriveGateway;
use crate::types::TaskPoll;
use async_trait::async_trait;
use core_runtime::config::Tuning;
use std::time::Duration;
use tracing::{debug, info};

/// Injectable clock for the poll loop.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Poll a copy task until it completes.
///
/// The provider is told how many polls already happened (`retry_index`)
/// so it can adjust its own back-off hints. Exceeding the ceiling yields
/// [`SyncError::PollCeiling`]; transport or envelope errors from a single
/// poll abort immediately.
pub async fn await_task(
    gateway: &dyn DriveGateway,
    sleeper: &dyn Sleeper,
    task_id: &str,
    tuning: &Tuning,
) -> Result<TaskPoll> {
    let interval_ms = tuning.poll_interval_ms.max(1);
    let interval = Duration::from_millis(interval_ms);
    let max_polls = (tuning.poll_ceiling_secs * 1000 / interval_ms).max(1);

    let mut retry_index: u32 = 0;
    loop {
        let poll = gateway.poll_task(task_id, retry_index).await?;
        if !poll.is_pending() {
            debug!(task_id = %task_id, status = poll.status, "Copy task finished");
            return Ok(poll);
        }

        if retry_index == 0 {
            info!(task_id = %task_id, title = %poll.title, "Waiting for copy task");
        } else {
            debug!(task_id = %task_id, retry_index, "Copy task still pending");
        }

        retry_index += 1;
        if u64::from(retry_index) >= max_polls {
            return Err(SyncError::PollCeiling {
                task_id: task_id.to_string(),
                waited_secs: tuning.poll_ceiling_secs,
            });
        }
        sleeper.sleep(interval).await;
    }
}
