//! End-to-end mirror runs against an in-memory drive.
//!
//! The fake gateway materializes saves into its destination listings, so
//! a second run over the same share must find nothing left to do.

use async_trait::async_trait;
use chrono::NaiveDate;
use core_runtime::config::{TaskConfig, Tuning};
use core_sync::{
    AccountInfo, DriveEntry, DriveGateway, GrowthInfo, PathFid, RecycleRecord, ResolvedShare,
    RunContext, ShareEntry, SyncCoordinator, SyncError, TaskPoll,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory drive: share listings are fixed, destination listings grow
/// as saves land.
#[derive(Default)]
struct FakeDrive {
    share_listings: HashMap<String, Vec<ShareEntry>>,
    dest_listings: Mutex<HashMap<String, Vec<DriveEntry>>>,
    paths: Mutex<HashMap<String, String>>,
    save_calls: AtomicU32,
    next_fid: AtomicU32,
}

impl FakeDrive {
    fn new() -> Self {
        Self::default()
    }

    fn with_share_dir(mut self, pdir_fid: &str, entries: Vec<ShareEntry>) -> Self {
        self.share_listings.insert(pdir_fid.to_string(), entries);
        self
    }

    fn with_dest_dir(self, path: &str, fid: &str, entries: Vec<DriveEntry>) -> Self {
        self.paths
            .lock()
            .unwrap()
            .insert(path.to_string(), fid.to_string());
        self.dest_listings
            .lock()
            .unwrap()
            .insert(fid.to_string(), entries);
        self
    }

    fn dest_names(&self, fid: &str) -> Vec<String> {
        self.dest_listings
            .lock()
            .unwrap()
            .get(fid)
            .map(|entries| entries.iter().map(|e| e.file_name.clone()).collect())
            .unwrap_or_default()
    }

    fn save_calls(&self) -> u32 {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriveGateway for FakeDrive {
    async fn account_info(&self) -> core_sync::Result<AccountInfo> {
        Ok(AccountInfo {
            nickname: "tester".to_string(),
        })
    }

    fn has_account_cookie(&self) -> bool {
        true
    }

    fn has_mobile_auth(&self) -> bool {
        false
    }

    async fn growth_info(&self) -> core_sync::Result<GrowthInfo> {
        Ok(GrowthInfo::default())
    }

    async fn growth_sign(&self) -> core_sync::Result<u64> {
        Ok(0)
    }

    async fn resolve_share(&self, _shareurl: &str) -> core_sync::Result<ResolvedShare> {
        Ok(ResolvedShare {
            pwd_id: "share-1".to_string(),
            stoken: "stoken-1".to_string(),
            root_fid: "0".to_string(),
        })
    }

    async fn list_share(
        &self,
        _share: &ResolvedShare,
        pdir_fid: &str,
    ) -> core_sync::Result<Vec<ShareEntry>> {
        Ok(self
            .share_listings
            .get(pdir_fid)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_dir(&self, pdir_fid: &str) -> core_sync::Result<Vec<DriveEntry>> {
        Ok(self
            .dest_listings
            .lock()
            .unwrap()
            .get(pdir_fid)
            .cloned()
            .unwrap_or_default())
    }

    async fn resolve_paths(&self, paths: &[String]) -> core_sync::Result<Vec<PathFid>> {
        let known = self.paths.lock().unwrap();
        Ok(paths
            .iter()
            .filter_map(|path| {
                known.get(path).map(|fid| PathFid {
                    file_path: path.clone(),
                    fid: fid.clone(),
                })
            })
            .collect())
    }

    async fn mkdir(&self, dir_path: &str) -> core_sync::Result<String> {
        let fid = format!("made-{}", self.next_fid.fetch_add(1, Ordering::SeqCst));
        self.paths
            .lock()
            .unwrap()
            .insert(dir_path.to_string(), fid.clone());
        self.dest_listings
            .lock()
            .unwrap()
            .insert(fid.clone(), Vec::new());
        Ok(fid)
    }

    async fn save_entries(
        &self,
        _share: &ResolvedShare,
        fids: &[String],
        _fid_tokens: &[String],
        to_pdir_fid: &str,
    ) -> core_sync::Result<String> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        // Materialize the copies under their share names right away.
        let mut dests = self.dest_listings.lock().unwrap();
        let target = dests.entry(to_pdir_fid.to_string()).or_default();
        for fid in fids {
            let entry = self
                .share_listings
                .values()
                .flatten()
                .find(|e| &e.fid == fid)
                .expect("saved fid must exist in a share listing");
            target.push(DriveEntry {
                fid: format!("copy-of-{}", entry.fid),
                file_name: entry.file_name.clone(),
                dir: entry.dir,
                created_at: 0,
            });
        }
        Ok("copy-task-1".to_string())
    }

    async fn poll_task(&self, _task_id: &str, _retry_index: u32) -> core_sync::Result<TaskPoll> {
        Ok(TaskPoll {
            status: 2,
            title: "copy".to_string(),
        })
    }

    async fn rename(&self, _fid: &str, _file_name: &str) -> core_sync::Result<()> {
        Ok(())
    }

    async fn delete(&self, _fids: &[String]) -> core_sync::Result<()> {
        Ok(())
    }

    async fn recycle_list(&self) -> core_sync::Result<Vec<RecycleRecord>> {
        Ok(vec![])
    }

    async fn recycle_purge(&self, _record_ids: &[String]) -> core_sync::Result<()> {
        Ok(())
    }
}

fn share_file(fid: &str, name: &str) -> ShareEntry {
    ShareEntry {
        fid: fid.to_string(),
        file_name: name.to_string(),
        dir: false,
        obj_category: "video".to_string(),
        share_fid_token: format!("token-{}", fid),
    }
}

fn share_dir(fid: &str, name: &str) -> ShareEntry {
    ShareEntry {
        fid: fid.to_string(),
        file_name: name.to_string(),
        dir: true,
        obj_category: String::new(),
        share_fid_token: format!("token-{}", fid),
    }
}

fn dest_file(fid: &str, name: &str) -> DriveEntry {
    DriveEntry {
        fid: fid.to_string(),
        file_name: name.to_string(),
        dir: false,
        created_at: 0,
    }
}

fn task(savepath: &str) -> TaskConfig {
    TaskConfig {
        taskname: "show".to_string(),
        shareurl: "https://pan.example.com/s/abc".to_string(),
        savepath: savepath.to_string(),
        pattern: None,
        replace: None,
        ignore_extension: false,
        enddate: None,
        runweek: vec![],
        startfid: None,
        update_subdir: None,
        emby_id: None,
        shareurl_ban: None,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
}

#[tokio::test]
async fn test_first_run_saves_then_second_run_is_noop() {
    let drive = Arc::new(
        FakeDrive::new()
            .with_share_dir(
                "0",
                vec![share_file("f1", "E01.mkv"), share_file("f2", "E02.mkv")],
            )
            .with_dest_dir("/tv/show", "dest-1", vec![dest_file("old", "E01.mkv")]),
    );
    let coordinator = SyncCoordinator::new(drive.clone(), None, HashMap::new());

    let mut tasks = vec![task("/tv/show")];
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, None, today())
        .await;

    assert_eq!(drive.save_calls(), 1);
    let names = drive.dest_names("dest-1");
    assert!(names.contains(&"E02.mkv".to_string()));
    assert!(ctx.has_notifications());
    let body = ctx.take_notification_body();
    assert!(body.contains("E02.mkv"));
    assert!(!body.contains("E01.mkv"), "existing entry must not be re-saved");

    // second run over the now-complete destination
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, None, today())
        .await;
    assert_eq!(drive.save_calls(), 1, "no further save expected");
    assert!(!ctx.has_notifications());
}

#[tokio::test]
async fn test_single_folder_share_is_unwrapped() {
    let drive = Arc::new(
        FakeDrive::new()
            .with_share_dir("0", vec![share_dir("wrap", "Show Season 1")])
            .with_share_dir("wrap", vec![share_file("f1", "E01.mkv")])
            .with_dest_dir("/tv/show", "dest-1", vec![]),
    );
    let coordinator = SyncCoordinator::new(drive.clone(), None, HashMap::new());

    let mut tasks = vec![task("/tv/show")];
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, None, today())
        .await;

    // the wrapper folder itself is not mirrored, only its content
    let names = drive.dest_names("dest-1");
    assert_eq!(names, vec!["E01.mkv".to_string()]);
}

#[tokio::test]
async fn test_recursion_into_existing_subdir() {
    let drive = Arc::new(
        FakeDrive::new()
            .with_share_dir(
                "0",
                vec![share_dir("s2", "Season 2"), share_file("f0", "intro.mkv")],
            )
            .with_share_dir(
                "s2",
                vec![share_file("f1", "E01.mkv"), share_file("f2", "E02.mkv")],
            )
            .with_dest_dir(
                "/tv/show",
                "dest-1",
                vec![
                    DriveEntry {
                        fid: "dest-s2".to_string(),
                        file_name: "Season 2".to_string(),
                        dir: true,
                        created_at: 0,
                    },
                    dest_file("old", "intro.mkv"),
                ],
            )
            .with_dest_dir("/tv/show/Season 2", "dest-s2", vec![dest_file("d1", "E01.mkv")]),
    );
    let coordinator = SyncCoordinator::new(drive.clone(), None, HashMap::new());

    let mut tasks = vec![task("/tv/show")];
    tasks[0].update_subdir = Some(r"^Season \d+$".to_string());
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, None, today())
        .await;

    let names = drive.dest_names("dest-s2");
    assert!(names.contains(&"E02.mkv".to_string()));
    assert_eq!(names.iter().filter(|n| *n == "E01.mkv").count(), 1);

    let body = ctx.take_notification_body();
    assert!(body.contains("Season 2"));
    assert!(body.contains("E02.mkv"));
}

#[tokio::test]
async fn test_empty_share_bans_and_notifies() {
    let drive = Arc::new(FakeDrive::new().with_dest_dir("/tv/show", "dest-1", vec![]));
    let coordinator = SyncCoordinator::new(drive.clone(), None, HashMap::new());

    let mut tasks = vec![task("/tv/show")];
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, None, today())
        .await;

    assert!(tasks[0].shareurl_ban.is_some());
    assert!(ctx.has_notifications());
    assert_eq!(drive.save_calls(), 0);

    // the ban sticks: a second run never touches the share again
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, None, today())
        .await;
    assert!(!ctx.has_notifications());
}

#[tokio::test]
async fn test_missing_destination_is_created() {
    let drive = Arc::new(FakeDrive::new().with_share_dir("0", vec![share_file("f1", "E01.mkv")]));
    let coordinator = SyncCoordinator::new(drive.clone(), None, HashMap::new());

    let mut tasks = vec![task("/tv/new-show")];
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, None, today())
        .await;

    let fid = drive
        .paths
        .lock()
        .unwrap()
        .get("/tv/new-show")
        .cloned()
        .expect("destination directory created");
    assert_eq!(drive.dest_names(&fid), vec!["E01.mkv".to_string()]);
}

#[tokio::test]
async fn test_task_index_filter() {
    let drive = Arc::new(
        FakeDrive::new()
            .with_share_dir("0", vec![share_file("f1", "E01.mkv")])
            .with_dest_dir("/tv/a", "dest-a", vec![])
            .with_dest_dir("/tv/b", "dest-b", vec![]),
    );
    let coordinator = SyncCoordinator::new(drive.clone(), None, HashMap::new());

    let mut tasks = vec![task("/tv/a"), task("/tv/b")];
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, Some(1), today())
        .await;

    assert!(drive.dest_names("dest-a").is_empty());
    assert_eq!(drive.dest_names("dest-b"), vec!["E01.mkv".to_string()]);
}

#[tokio::test]
async fn test_share_error_is_reported_not_fatal() {
    struct FailingDrive(FakeDrive);

    #[async_trait]
    impl DriveGateway for FailingDrive {
        async fn account_info(&self) -> core_sync::Result<AccountInfo> {
            self.0.account_info().await
        }
        fn has_account_cookie(&self) -> bool {
            true
        }
        fn has_mobile_auth(&self) -> bool {
            false
        }
        async fn growth_info(&self) -> core_sync::Result<GrowthInfo> {
            self.0.growth_info().await
        }
        async fn growth_sign(&self) -> core_sync::Result<u64> {
            self.0.growth_sign().await
        }
        async fn resolve_share(&self, _shareurl: &str) -> core_sync::Result<ResolvedShare> {
            Err(SyncError::Transport("connection reset".to_string()))
        }
        async fn list_share(
            &self,
            share: &ResolvedShare,
            pdir_fid: &str,
        ) -> core_sync::Result<Vec<ShareEntry>> {
            self.0.list_share(share, pdir_fid).await
        }
        async fn list_dir(&self, pdir_fid: &str) -> core_sync::Result<Vec<DriveEntry>> {
            self.0.list_dir(pdir_fid).await
        }
        async fn resolve_paths(&self, paths: &[String]) -> core_sync::Result<Vec<PathFid>> {
            self.0.resolve_paths(paths).await
        }
        async fn mkdir(&self, dir_path: &str) -> core_sync::Result<String> {
            self.0.mkdir(dir_path).await
        }
        async fn save_entries(
            &self,
            share: &ResolvedShare,
            fids: &[String],
            fid_tokens: &[String],
            to_pdir_fid: &str,
        ) -> core_sync::Result<String> {
            self.0.save_entries(share, fids, fid_tokens, to_pdir_fid).await
        }
        async fn poll_task(
            &self,
            task_id: &str,
            retry_index: u32,
        ) -> core_sync::Result<TaskPoll> {
            self.0.poll_task(task_id, retry_index).await
        }
        async fn rename(&self, fid: &str, file_name: &str) -> core_sync::Result<()> {
            self.0.rename(fid, file_name).await
        }
        async fn delete(&self, fids: &[String]) -> core_sync::Result<()> {
            self.0.delete(fids).await
        }
        async fn recycle_list(&self) -> core_sync::Result<Vec<RecycleRecord>> {
            self.0.recycle_list().await
        }
        async fn recycle_purge(&self, record_ids: &[String]) -> core_sync::Result<()> {
            self.0.recycle_purge(record_ids).await
        }
    }

    let drive = Arc::new(FailingDrive(
        FakeDrive::new().with_dest_dir("/tv/show", "dest-1", vec![]),
    ));
    let coordinator = SyncCoordinator::new(drive, None, HashMap::new());

    let mut tasks = vec![task("/tv/show")];
    let mut ctx = RunContext::new(Tuning::default());
    coordinator
        .run_account(&mut ctx, &mut tasks, None, today())
        .await;

    // a transient failure never bans the share
    assert!(tasks[0].shareurl_ban.is_none());
    assert!(ctx.take_notification_body().contains("share check failed"));
}
