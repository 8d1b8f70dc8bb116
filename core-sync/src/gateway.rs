//! Engine-side traits for the remote collaborators.
//!
//! `DriveGateway` is the seam between the sync engine and the storage
//! provider's HTTP API; `MediaLibrary` is the narrow contract to the
//! external library-refresh collaborator. Providers implement these the
//! way they see fit; the engine only ever talks to the traits.

use crate::error::Result;
use crate::types::{
    AccountInfo, DriveEntry, GrowthInfo, PathFid, RecycleRecord, ResolvedShare, ShareEntry,
    TaskPoll,
};
use async_trait::async_trait;

/// One operation per provider endpoint. Every call returns either a typed
/// payload or a structured [`SyncError`](crate::SyncError); transport
/// anomalies are shaped into error values by the implementation, never
/// panics. No caching happens at this layer.
#[async_trait]
pub trait DriveGateway: Send + Sync {
    /// Verify the credential and fetch the account identity.
    async fn account_info(&self) -> Result<AccountInfo>;

    /// Whether the credential looks like a full account cookie (save
    /// operations possible) rather than a sign-in-only token.
    fn has_account_cookie(&self) -> bool;

    /// Whether the credential carries the mobile-auth parameters required
    /// by the growth (sign-in) endpoints.
    fn has_mobile_auth(&self) -> bool;

    /// Capacity/growth snapshot.
    async fn growth_info(&self) -> Result<GrowthInfo>;

    /// Perform today's sign-in; returns the awarded bytes.
    async fn growth_sign(&self) -> Result<u64>;

    /// Parse a share URL and exchange it for a session-scoped token.
    async fn resolve_share(&self, shareurl: &str) -> Result<ResolvedShare>;

    /// List a directory inside a share (all pages).
    async fn list_share(&self, share: &ResolvedShare, pdir_fid: &str) -> Result<Vec<ShareEntry>>;

    /// List a destination directory (all pages).
    async fn list_dir(&self, pdir_fid: &str) -> Result<Vec<DriveEntry>>;

    /// Batch-resolve absolute destination paths to directory ids.
    /// Paths that do not exist are absent from the result.
    async fn resolve_paths(&self, paths: &[String]) -> Result<Vec<PathFid>>;

    /// Create a directory (and missing parents) at an absolute path.
    async fn mkdir(&self, dir_path: &str) -> Result<String>;

    /// Copy share entries into a destination directory. Returns the id of
    /// the asynchronous copy task to poll.
    async fn save_entries(
        &self,
        share: &ResolvedShare,
        fids: &[String],
        fid_tokens: &[String],
        to_pdir_fid: &str,
    ) -> Result<String>;

    /// Poll an asynchronous copy task once.
    async fn poll_task(&self, task_id: &str, retry_index: u32) -> Result<TaskPoll>;

    /// Rename a single entry.
    async fn rename(&self, fid: &str, file_name: &str) -> Result<()>;

    /// Soft-delete entries (move to recycle bin).
    async fn delete(&self, fids: &[String]) -> Result<()>;

    /// List the recycle bin (first page is enough for cleanup).
    async fn recycle_list(&self) -> Result<Vec<RecycleRecord>>;

    /// Permanently purge specific records from the recycle bin.
    async fn recycle_purge(&self, record_ids: &[String]) -> Result<()>;
}

/// External media-library collaborator.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Find the library item id matching a task name.
    async fn search(&self, name: &str) -> Result<Option<String>>;

    /// Trigger a metadata refresh of a library item.
    async fn refresh(&self, id: &str) -> Result<bool>;
}

#[cfg(test)]
mockall::mock! {
    pub DriveGateway {}

    #[async_trait]
    impl DriveGateway for DriveGateway {
        async fn account_info(&self) -> Result<AccountInfo>;
        fn has_account_cookie(&self) -> bool;
        fn has_mobile_auth(&self) -> bool;
        async fn growth_info(&self) -> Result<GrowthInfo>;
        async fn growth_sign(&self) -> Result<u64>;
        async fn resolve_share(&self, shareurl: &str) -> Result<ResolvedShare>;
        async fn list_share(&self, share: &ResolvedShare, pdir_fid: &str) -> Result<Vec<ShareEntry>>;
        async fn list_dir(&self, pdir_fid: &str) -> Result<Vec<DriveEntry>>;
        async fn resolve_paths(&self, paths: &[String]) -> Result<Vec<PathFid>>;
        async fn mkdir(&self, dir_path: &str) -> Result<String>;
        async fn save_entries(
            &self,
            share: &ResolvedShare,
            fids: &[String],
            fid_tokens: &[String],
            to_pdir_fid: &str,
        ) -> Result<String>;
        async fn poll_task(&self, task_id: &str, retry_index: u32) -> Result<TaskPoll>;
        async fn rename(&self, fid: &str, file_name: &str) -> Result<()>;
        async fn delete(&self, fids: &[String]) -> Result<()>;
        async fn recycle_list(&self) -> Result<Vec<RecycleRecord>>;
        async fn recycle_purge(&self, record_ids: &[String]) -> Result<()>;
    }
}

#[cfg(test)]
mockall::mock! {
    pub MediaLibrary {}

    #[async_trait]
    impl MediaLibrary for MediaLibrary {
        async fn search(&self, name: &str) -> Result<Option<String>>;
        async fn refresh(&self, id: &str) -> Result<bool>;
    }
}
