//! Post-save duplicate cleanup.
//!
//! The provider materializes a second entry when a copy lands next to an
//! existing entry with the same display name. After a copy task
//! completes, the destination is re-listed and recent same-named extras
//! are soft-deleted, then purged from the recycle bin so they do not eat
//! quota.

use crate::error::Result;
use crate::gateway::DriveGateway;
use tracing::{debug, info, warn};

/// Remove provider-created duplicates of just-saved entries.
///
/// For every saved name that now appears more than once in the listing,
/// the oldest entry is kept and the rest are deleted, provided they were
/// created within `window_secs` of `now_epoch` (older same-named entries
/// predate this save and are left alone). Returns how many entries were
/// removed.
pub async fn purge_duplicates(
    gateway: &dyn DriveGateway,
    dest_fid: &str,
    saved_names: &[String],
    window_secs: i64,
    now_epoch: i64,
) -> Result<usize> {
    let listing = gateway.list_dir(dest_fid).await?;

    let mut doomed: Vec<String> = Vec::new();
    for name in saved_names {
        let mut same_name: Vec<_> = listing.iter().filter(|e| &e.file_name == name).collect();
        if same_name.len() < 2 {
            continue;
        }
        // Keep the oldest copy of the name.
        same_name.sort_by_key(|e| e.created_at);
        for extra in &same_name[1..] {
            if now_epoch - extra.created_at < window_secs {
                debug!(name = %name, fid = %extra.fid, "Marking duplicate for removal");
                doomed.push(extra.fid.clone());
            }
        }
    }

    if doomed.is_empty() {
        return Ok(0);
    }

    gateway.delete(&doomed).await?;

    let records: Vec<String> = gateway
        .recycle_list()
        .await?
        .into_iter()
        .filter(|r| doomed.contains(&r.fid))
        .map(|r| r.record_id)
        .collect();
    if records.is_empty() {
        warn!("Deleted duplicates not found in recycle bin");
    } else {
        gateway.recycle_purge(&records).await?;
    }

    info!(count = doomed.len(), "Removed duplicate entries");
    Ok(doomed.len())
}
