//! Destination directory resolution.
//!
//! Turns absolute destination paths into directory ids with as few API
//! round trips as possible: cached ids are reused, the remainder is
//! looked up in batches, and whatever still does not exist is created
//! with one concurrent mkdir per missing path.

use crate::context::{normalize_path, RunContext};
use crate::gateway::DriveGateway;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Resolve (creating where necessary) a set of destination paths.
///
/// Returns normalized path → directory id for every path that could be
/// resolved; paths whose lookup or creation failed are logged and left
/// out, so callers skip the corresponding subtree instead of aborting
/// the whole run. All resolved ids are folded into the context cache.
pub async fn resolve_dirs(
    gateway: &dyn DriveGateway,
    ctx: &mut RunContext,
    paths: &[String],
) -> HashMap<String, String> {
    let mut resolved = HashMap::new();
    let mut missing = Vec::new();

    for path in paths {
        let path = normalize_path(path);
        if resolved.contains_key(&path) || missing.contains(&path) {
            continue;
        }
        match ctx.cached_fid(&path) {
            Some(fid) => {
                resolved.insert(path, fid.clone());
            }
            None => missing.push(path),
        }
    }

    if missing.is_empty() {
        return resolved;
    }
    debug!(count = missing.len(), "Resolving uncached destination paths");

    let batch = ctx.tuning.path_batch.max(1);
    let mut unresolved = Vec::new();
    for chunk in missing.chunks(batch) {
        match gateway.resolve_paths(chunk).await {
            Ok(found) => {
                let mut hit: HashMap<&str, &str> = HashMap::new();
                for pf in &found {
                    hit.insert(pf.file_path.as_str(), pf.fid.as_str());
                }
                for path in chunk {
                    match hit.get(path.as_str()) {
                        Some(fid) => {
                            resolved.insert(path.clone(), fid.to_string());
                        }
                        None => unresolved.push(path.clone()),
                    }
                }
            }
            Err(e) => {
                // Skip creation for a chunk we could not even look up.
                error!(error = %e, "Batch path lookup failed");
            }
        }
    }

    if !unresolved.is_empty() {
        let creations = join_all(unresolved.iter().map(|path| gateway.mkdir(path))).await;
        for (path, outcome) in unresolved.into_iter().zip(creations) {
            match outcome {
                Ok(fid) => {
                    info!(path = %path, "Created destination directory");
                    resolved.insert(path, fid);
                }
                Err(e) => {
                    error!(path = %path, error = %e, "Failed to create destination directory");
                }
            }
        }
    }

    for (path, fid) in &resolved {
        ctx.cache_fid(path.clone(), fid.clone());
    }
    resolved
}
