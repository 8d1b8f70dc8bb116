//! Per-account sync orchestration.
//!
//! `SyncCoordinator` drives every task of one account through the full
//! pipeline: share check, per-level diff, save, poll, duplicate cleanup,
//! rename pass and the optional media-library refresh. Tasks run
//! sequentially; fan-out happens inside a task (directory creation,
//! renames), never across tasks, so the directory cache stays a plain
//! `&mut`.

use crate::cleanup;
use crate::context::{normalize_path, RunContext};
use crate::error::{Result, SyncError};
use crate::gateway::{DriveGateway, MediaLibrary};
use crate::planner::{self, DiffPolicy};
use crate::poller::{self, Sleeper, TokioSleeper};
use crate::rename::rename_subtree;
use crate::resolver;
use crate::schedule;
use crate::state::TaskState;
use crate::tree::ReportTree;
use crate::types::ResolvedShare;
use chrono::{NaiveDate, Utc};
use core_runtime::config::{MagicEntry, TaskConfig};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a task attempt changed, for the refresh decision.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskOutcome {
    pub saved: bool,
    pub renamed: bool,
}

pub struct SyncCoordinator {
    gateway: Arc<dyn DriveGateway>,
    library: Option<Arc<dyn MediaLibrary>>,
    magic: HashMap<String, MagicEntry>,
    sleeper: Arc<dyn Sleeper>,
}

impl SyncCoordinator {
    pub fn new(
        gateway: Arc<dyn DriveGateway>,
        library: Option<Arc<dyn MediaLibrary>>,
        magic: HashMap<String, MagicEntry>,
    ) -> Self {
        Self {
            gateway,
            library,
            magic,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the poll clock (tests).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run all (or one, when `only_task` is set) tasks of an account.
    ///
    /// Destination directories of every eligible task are resolved up
    /// front in one batched pass, then tasks execute in config order.
    /// Mutations (bans, backfilled library ids) land directly in `tasks`
    /// for the caller to persist.
    pub async fn run_account(
        &self,
        ctx: &mut RunContext,
        tasks: &mut [TaskConfig],
        only_task: Option<usize>,
        today: NaiveDate,
    ) {
        let prefetch: Vec<String> = tasks
            .iter()
            .enumerate()
            .filter(|(index, task)| {
                only_task.map_or(true, |only| only == *index)
                    && task.shareurl_ban.is_none()
                    && schedule::is_due(task, today)
            })
            .map(|(_, task)| task.savepath.clone())
            .collect();
        if !prefetch.is_empty() {
            resolver::resolve_dirs(self.gateway.as_ref(), ctx, &prefetch).await;
        }

        for (index, task) in tasks.iter_mut().enumerate() {
            if only_task.is_some_and(|only| only != index) {
                continue;
            }
            info!(index, taskname = %task.taskname, "Task");
            if let Some(reason) = &task.shareurl_ban {
                info!(state = %TaskState::Banned, reason = %reason, "Share is banned, skipping");
                continue;
            }
            if !schedule::is_due(task, today) {
                info!(state = %TaskState::Skipped, "Not scheduled today");
                continue;
            }

            let outcome = self.run_task(ctx, task).await;
            if outcome.saved || outcome.renamed {
                self.refresh_library(task).await;
            }
        }
    }

    /// One task attempt, end to end. Failures are folded into the
    /// account's notification buffer instead of propagating.
    async fn run_task(&self, ctx: &mut RunContext, task: &mut TaskConfig) -> TaskOutcome {
        let mut outcome = TaskOutcome::default();

        debug!(state = %TaskState::Pending, taskname = %task.taskname);
        debug!(state = %TaskState::CheckingShare, shareurl = %task.shareurl);
        let share = match self.gateway.resolve_share(&task.shareurl).await {
            Ok(share) => share,
            Err(SyncError::ShareInvalid { reason }) => {
                ctx.notify(format!("❌ {}: share invalid: {}", task.taskname, reason));
                task.shareurl_ban = Some(reason);
                debug!(state = %TaskState::Banned);
                return outcome;
            }
            Err(e) => {
                ctx.notify(format!("❌ {}: share check failed: {}", task.taskname, e));
                return outcome;
            }
        };

        let policy = match DiffPolicy::compile(task, &self.magic) {
            Ok(policy) => policy,
            Err(e) => {
                ctx.notify(format!("❌ {}: {}", task.taskname, e));
                return outcome;
            }
        };

        debug!(state = %TaskState::Diffing);
        let mirrored = self
            .mirror_dir(
                ctx,
                task,
                &policy,
                &share,
                share.root_fid.clone(),
                String::new(),
                true,
            )
            .await;
        match mirrored {
            Ok(tree) if !tree.is_empty() => {
                outcome.saved = true;
                ctx.notify(format!(
                    "✅ {}: {} new item(s)\n{}",
                    task.taskname,
                    tree.size(),
                    tree.render()
                ));
            }
            Ok(_) => info!(taskname = %task.taskname, "Up to date"),
            Err(SyncError::ShareInvalid { reason }) => {
                ctx.notify(format!("❌ {}: {}", task.taskname, reason));
                task.shareurl_ban = Some(reason);
                debug!(state = %TaskState::Banned);
                return outcome;
            }
            Err(e) => {
                ctx.notify(format!("❌ {}: sync failed: {}", task.taskname, e));
                return outcome;
            }
        }

        if let Some((pattern, replace)) = policy.rename_rule() {
            debug!(state = %TaskState::Renaming);
            let savepath = normalize_path(&task.savepath);
            if let Some(fid) = ctx.cached_fid(&savepath).cloned() {
                match rename_subtree(self.gateway.as_ref(), pattern, replace, &fid).await {
                    Ok(changed) => outcome.renamed = changed,
                    Err(e) => warn!(error = %e, "Rename pass failed"),
                }
            }
        }

        debug!(state = %TaskState::Done);
        outcome
    }

    /// Mirror one share directory level into its destination, recursing
    /// into existing subdirectories when the task enables it. Returns the
    /// subtree of newly saved entries for the notification.
    fn mirror_dir<'a>(
        &'a self,
        ctx: &'a mut RunContext,
        task: &'a TaskConfig,
        policy: &'a DiffPolicy,
        share: &'a ResolvedShare,
        pdir_fid: String,
        subdir: String,
        is_root: bool,
    ) -> BoxFuture<'a, Result<ReportTree>> {
        async move {
            let savepath = normalize_path(&format!("{}/{}", task.savepath, subdir));
            let mut tree = ReportTree::new(savepath.clone(), pdir_fid.clone());

            let mut share_entries = self.gateway.list_share(share, &pdir_fid).await?;
            if share_entries.is_empty() {
                if is_root {
                    // The sharer emptied the share; treat like a dead link.
                    return Err(SyncError::ShareInvalid {
                        reason: "share is empty, the shared files were removed".to_string(),
                    });
                }
                return Ok(tree);
            }
            if is_root && share_entries.len() == 1 && share_entries[0].dir {
                debug!(folder = %share_entries[0].file_name, "Descending into single shared folder");
                share_entries = self.gateway.list_share(share, &share_entries[0].fid).await?;
            }

            let dest_fid = match ctx.cached_fid(&savepath).cloned() {
                Some(fid) => fid,
                None => {
                    let resolved = resolver::resolve_dirs(
                        self.gateway.as_ref(),
                        &mut *ctx,
                        std::slice::from_ref(&savepath),
                    )
                    .await;
                    match resolved.get(&savepath).cloned() {
                        Some(fid) => fid,
                        None => {
                            error!(path = %savepath, "Destination unavailable, skipping subtree");
                            return Ok(tree);
                        }
                    }
                }
            };
            tree.fid = dest_fid.clone();

            let dest_entries = self.gateway.list_dir(&dest_fid).await?;
            let plan = planner::plan(policy, &share_entries, &dest_entries);

            if !plan.saves.is_empty() {
                debug!(state = %TaskState::Saving, count = plan.saves.len(), path = %savepath);
                let tuning = ctx.tuning.clone();
                let fids: Vec<String> = plan.saves.iter().map(|s| s.entry.fid.clone()).collect();
                let tokens: Vec<String> = plan
                    .saves
                    .iter()
                    .map(|s| s.entry.share_fid_token.clone())
                    .collect();

                match self
                    .gateway
                    .save_entries(share, &fids, &tokens, &dest_fid)
                    .await
                {
                    Ok(task_id) => {
                        debug!(state = %TaskState::Polling, task_id = %task_id);
                        let settled = poller::await_task(
                            self.gateway.as_ref(),
                            self.sleeper.as_ref(),
                            &task_id,
                            &tuning,
                        )
                        .await;
                        match settled {
                            Ok(_) => {
                                debug!(state = %TaskState::Cleaning);
                                let saved_names: Vec<String> =
                                    plan.saves.iter().map(|s| s.save_name.clone()).collect();
                                if let Err(e) = cleanup::purge_duplicates(
                                    self.gateway.as_ref(),
                                    &dest_fid,
                                    &saved_names,
                                    tuning.dup_window_secs as i64,
                                    Utc::now().timestamp(),
                                )
                                .await
                                {
                                    warn!(error = %e, "Duplicate cleanup failed");
                                }
                                for saved in &plan.saves {
                                    let icon = if saved.entry.dir {
                                        "📁"
                                    } else if saved.entry.obj_category == "video" {
                                        "🎞️"
                                    } else {
                                        ""
                                    };
                                    tree.add_leaf(
                                        format!("{}{}", icon, saved.save_name),
                                        saved.entry.fid.clone(),
                                    );
                                }
                            }
                            Err(e) => {
                                ctx.notify(format!(
                                    "❌ {}: copy task did not complete: {}",
                                    task.taskname, e
                                ));
                            }
                        }
                    }
                    Err(e) => {
                        ctx.notify(format!("❌ {}: save failed: {}", task.taskname, e));
                    }
                }
            }

            for target in &plan.recursions {
                let child_path = normalize_path(&format!("{}/{}", savepath, target.dir_name));
                ctx.cache_fid(child_path, target.dest_fid.clone());
                let child_sub = if subdir.is_empty() {
                    target.dir_name.clone()
                } else {
                    format!("{}/{}", subdir, target.dir_name)
                };
                let child = self
                    .mirror_dir(
                        &mut *ctx,
                        task,
                        policy,
                        share,
                        target.share_fid.clone(),
                        child_sub,
                        false,
                    )
                    .await?;
                if !child.is_empty() {
                    tree.add_subtree(
                        format!("📁{}", target.dir_name),
                        target.dest_fid.clone(),
                        child,
                    );
                }
            }

            Ok(tree)
        }
        .boxed()
    }

    /// Trigger a media-library refresh after a task changed something.
    /// `"0"` opts the task out; a missing id is backfilled by name search.
    async fn refresh_library(&self, task: &mut TaskConfig) {
        let Some(library) = &self.library else { return };
        match task.emby_id.as_deref() {
            Some("0") => {}
            Some(id) if !id.is_empty() => match library.refresh(id).await {
                Ok(true) => info!(taskname = %task.taskname, id = %id, "Library refresh triggered"),
                Ok(false) => warn!(id = %id, "Library refresh was rejected"),
                Err(e) => warn!(error = %e, "Library refresh failed"),
            },
            _ => match library.search(&task.taskname).await {
                Ok(Some(id)) => {
                    if let Err(e) = library.refresh(&id).await {
                        warn!(error = %e, "Library refresh failed");
                    } else {
                        info!(taskname = %task.taskname, id = %id, "Library item found, refresh triggered");
                    }
                    task.emby_id = Some(id);
                }
                Ok(None) => debug!(taskname = %task.taskname, "No matching library item"),
                Err(e) => warn!(error = %e, "Library search failed"),
            },
        }
    }
}
