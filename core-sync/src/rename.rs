//! Recursive rename pass.
//!
//! After the mirror pass the destination tree may hold entries under
//! their original share names (saved before a pattern was configured, or
//! by hand). This walk applies the task's pattern/replace template to
//! every matching name, level by level, fanning the renames of one level
//! out concurrently.

use crate::error::Result;
use crate::gateway::DriveGateway;
use crate::planner::expand_template;
use futures::future::{join_all, BoxFuture, FutureExt};
use regex::Regex;
use tracing::{info, warn};

/// Rename matching entries under `dir_fid`, recursing into
/// subdirectories. Returns whether anything was actually renamed.
///
/// Directories are both rename candidates and recursion points; the
/// recursion goes by fid, so it survives the rename. A derived name
/// equal to the current one is a no-op; a derived name already present
/// at the same level is skipped to avoid collisions. A single failed
/// rename is logged and does not stop the rest.
pub fn rename_subtree<'a>(
    gateway: &'a dyn DriveGateway,
    pattern: &'a Regex,
    replace: &'a str,
    dir_fid: &'a str,
) -> BoxFuture<'a, Result<bool>> {
    async move {
        let listing = gateway.list_dir(dir_fid).await?;
        let names: Vec<&str> = listing.iter().map(|e| e.file_name.as_str()).collect();

        let mut jobs: Vec<BoxFuture<'_, Result<bool>>> = Vec::new();
        for entry in &listing {
            if entry.dir {
                jobs.push(rename_subtree(gateway, pattern, replace, &entry.fid));
            }
            let Some(renamed) = expand_template(pattern, replace, &entry.file_name) else {
                continue;
            };
            if renamed == entry.file_name || names.contains(&renamed.as_str()) {
                continue;
            }
            jobs.push(
                async move {
                    match gateway.rename(&entry.fid, &renamed).await {
                        Ok(()) => {
                            info!(from = %entry.file_name, to = %renamed, "Renamed");
                            Ok(true)
                        }
                        Err(e) => {
                            warn!(fid = %entry.fid, error = %e, "Rename failed");
                            Ok(false)
                        }
                    }
                }
                .boxed(),
            );
        }

        let mut changed = false;
        for outcome in join_all(jobs).await {
            changed |= outcome?;
        }
        Ok(changed)
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockDriveGateway;
    use crate::types::DriveEntry;
    use mockall::predicate::eq;

    fn file(fid: &str, name: &str) -> DriveEntry {
        DriveEntry {
            fid: fid.to_string(),
            file_name: name.to_string(),
            dir: false,
            created_at: 0,
        }
    }

    fn folder(fid: &str, name: &str) -> DriveEntry {
        DriveEntry {
            fid: fid.to_string(),
            file_name: name.to_string(),
            dir: true,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_renames_matching_files() {
        let mut gateway = MockDriveGateway::new();
        gateway.expect_list_dir().with(eq("root")).returning(|_| {
            Ok(vec![
                file("f1", "Show.S1E02.1080p.mkv"),
                file("f2", "readme.txt"),
            ])
        });
        gateway
            .expect_rename()
            .with(eq("f1"), eq("S1E02.mkv"))
            .times(1)
            .returning(|_, _| Ok(()));

        let pattern = Regex::new(r"S(\d)E(\d+).*\.(mkv)").unwrap();
        let changed = rename_subtree(&gateway, &pattern, "S$1E$2.$3", "root")
            .await
            .unwrap();
        assert!(changed);
    }

    #[tokio::test]
    async fn test_noop_and_collisions_are_skipped() {
        let mut gateway = MockDriveGateway::new();
        gateway.expect_list_dir().with(eq("root")).returning(|_| {
            Ok(vec![
                // already in target form
                file("f1", "S1E01.mkv"),
                // would collide with f3
                file("f2", "Show.S1E02.1080p.mkv"),
                file("f3", "S1E02.mkv"),
            ])
        });
        // no rename expectation: none may happen

        let pattern = Regex::new(r"S(\d)E(\d+).*\.(mkv)").unwrap();
        let changed = rename_subtree(&gateway, &pattern, "S$1E$2.$3", "root")
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_recurses_into_subdirectories() {
        let mut gateway = MockDriveGateway::new();
        gateway
            .expect_list_dir()
            .with(eq("root"))
            .returning(|_| Ok(vec![folder("d1", "Season 2")]));
        gateway
            .expect_list_dir()
            .with(eq("d1"))
            .returning(|_| Ok(vec![file("f1", "Show.S2E01.WEB.mkv")]));
        gateway
            .expect_rename()
            .with(eq("f1"), eq("S2E01.mkv"))
            .times(1)
            .returning(|_, _| Ok(()));

        let pattern = Regex::new(r"S(\d)E(\d+).*\.(mkv)").unwrap();
        let changed = rename_subtree(&gateway, &pattern, "S$1E$2.$3", "root")
            .await
            .unwrap();
        assert!(changed);
    }

    #[tokio::test]
    async fn test_matching_directory_is_renamed() {
        let mut gateway = MockDriveGateway::new();
        gateway
            .expect_list_dir()
            .with(eq("root"))
            .returning(|_| Ok(vec![folder("d1", "Show.S1.Complete")]));
        gateway
            .expect_list_dir()
            .with(eq("d1"))
            .returning(|_| Ok(vec![]));
        gateway
            .expect_rename()
            .with(eq("d1"), eq("Season 1"))
            .times(1)
            .returning(|_, _| Ok(()));

        let pattern = Regex::new(r"Show\.S(\d)\.Complete").unwrap();
        let changed = rename_subtree(&gateway, &pattern, "Season $1", "root")
            .await
            .unwrap();
        assert!(changed);
    }

    #[tokio::test]
    async fn test_failed_rename_does_not_abort() {
        let mut gateway = MockDriveGateway::new();
        gateway.expect_list_dir().with(eq("root")).returning(|_| {
            Ok(vec![
                file("f1", "Show.S1E01.WEB.mkv"),
                file("f2", "Show.S1E02.WEB.mkv"),
            ])
        });
        gateway.expect_rename().with(eq("f1"), eq("S1E01.mkv")).returning(|_, _| {
            Err(crate::SyncError::Api {
                code: 31001,
                message: "rename rejected".to_string(),
            })
        });
        gateway
            .expect_rename()
            .with(eq("f2"), eq("S1E02.mkv"))
            .times(1)
            .returning(|_, _| Ok(()));

        let pattern = Regex::new(r"S(\d)E(\d+).*\.(mkv)").unwrap();
        let changed = rename_subtree(&gateway, &pattern, "S$1E$2.$3", "root")
            .await
            .unwrap();
        assert!(changed);
    }
}
