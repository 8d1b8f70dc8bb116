//! Share diff & save planner.
//!
//! Pure per-directory-level diff: given a share listing and the already
//! mirrored destination listing, decide which entries to copy, which
//! existing subdirectories to recurse into, and where to stop. Name-based
//! diffing avoids re-transferring unchanged items across scheduled runs
//! without content hashes; per-level diffing lets the policy vary per
//! directory and bounds recursion to the portion that changed.

use crate::error::{Result, SyncError};
use crate::types::{DriveEntry, ShareEntry};
use core_runtime::config::{MagicEntry, TaskConfig};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Resolve a magic keyword (e.g. `$TV`) against the preset table.
///
/// Non-keyword patterns pass through unchanged; an explicit non-empty
/// replacement wins over the preset's.
pub fn resolve_magic(
    table: &HashMap<String, MagicEntry>,
    pattern: &str,
    replace: &str,
) -> (String, String) {
    match table.get(pattern) {
        Some(entry) => {
            let replace = if replace.is_empty() {
                entry.replace.clone()
            } else {
                replace.to_string()
            };
            (entry.pattern.clone(), replace)
        }
        None => (pattern.to_string(), replace.to_string()),
    }
}

/// Compiled per-task diff policy, applied at every directory level.
#[derive(Debug)]
pub struct DiffPolicy {
    /// General pattern for files (and directories when no subdir pattern)
    pattern: Regex,
    /// Replacement template; empty keeps the original name
    replace: String,
    /// Pattern for directory entries; presence enables recursion
    subdir_pattern: Option<Regex>,
    /// Compare names with extensions stripped
    pub ignore_extension: bool,
    /// Stop marker: processing halts after this fid (inclusive)
    pub stop_fid: Option<String>,
}

impl DiffPolicy {
    /// Compile a task's filtering/renaming rules.
    pub fn compile(task: &TaskConfig, magic: &HashMap<String, MagicEntry>) -> Result<Self> {
        let raw_pattern = task.pattern.as_deref().unwrap_or(".*");
        let raw_replace = task.replace.as_deref().unwrap_or("");
        let (pattern, replace) = resolve_magic(magic, raw_pattern, raw_replace);

        let pattern = Regex::new(&pattern).map_err(|e| SyncError::Pattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        let subdir_pattern = match &task.update_subdir {
            Some(p) => Some(Regex::new(p).map_err(|e| SyncError::Pattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            pattern,
            replace,
            subdir_pattern,
            ignore_extension: task.ignore_extension,
            stop_fid: task.startfid.clone(),
        })
    }

    /// Whether recursion into existing subdirectories is enabled.
    pub fn recurses(&self) -> bool {
        self.subdir_pattern.is_some()
    }

    /// The pattern/template pair for the rename pass, when the task has a
    /// non-empty replacement template.
    pub fn rename_rule(&self) -> Option<(&Regex, &str)> {
        if self.replace.is_empty() {
            None
        } else {
            Some((&self.pattern, self.replace.as_str()))
        }
    }

    /// Derive the save-name for a share entry, or `None` when the active
    /// pattern does not match at all (entry is filtered out).
    ///
    /// The name is the replacement template expanded over the first
    /// match's captures; an empty template keeps the original name.
    pub fn derive_name(&self, entry: &ShareEntry) -> Option<String> {
        let (pattern, replace) = if entry.dir {
            match &self.subdir_pattern {
                // Directories use the subdir pattern, never renamed.
                Some(p) => (p, ""),
                None => (&self.pattern, self.replace.as_str()),
            }
        } else {
            (&self.pattern, self.replace.as_str())
        };

        expand_template(pattern, replace, &entry.file_name)
    }

    /// Name-equality predicate for the dedup check.
    fn names_equal(&self, dest_name: &str, candidate: &str, is_dir: bool) -> bool {
        if self.ignore_extension && !is_dir {
            stem(dest_name) == stem(candidate)
        } else {
            dest_name == candidate
        }
    }
}

/// Expand `replace` over the first match of `pattern` in `name`.
///
/// `None` when the pattern does not match; an empty template keeps the
/// name as-is. Also used by the rename pass, which shares the template
/// semantics.
pub(crate) fn expand_template(pattern: &Regex, replace: &str, name: &str) -> Option<String> {
    let captures = pattern.captures(name)?;
    if replace.is_empty() {
        return Some(name.to_string());
    }
    let mut expanded = String::new();
    captures.expand(&brace_group_refs(replace), &mut expanded);
    Some(expanded)
}

/// Rewrite `$N` group references to `${N}` so that a literal letter or
/// digit directly after the reference (as in `S$1E$2`) is not swallowed
/// into the group name.
fn brace_group_refs(replace: &str) -> String {
    static GROUP_REF: OnceLock<Regex> = OnceLock::new();
    let re = GROUP_REF.get_or_init(|| Regex::new(r"\$(\d+)").unwrap());
    re.replace_all(replace, |c: &regex::Captures<'_>| format!("${{{}}}", &c[1]))
        .into_owned()
}

/// Strip the final extension, if any.
fn stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => name,
    }
}

/// A share entry selected for transfer, under its derived save-name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSave {
    pub entry: ShareEntry,
    pub save_name: String,
}

/// An existing destination subdirectory to recurse into instead of copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurseTarget {
    /// Directory fid on the share side
    pub share_fid: String,
    /// Directory name (share side), used to extend the destination path
    pub dir_name: String,
    /// Matching destination directory fid
    pub dest_fid: String,
}

/// Outcome of one directory-level diff.
#[derive(Debug, Default)]
pub struct SavePlan {
    pub saves: Vec<PlannedSave>,
    pub recursions: Vec<RecurseTarget>,
    /// Whether the stop marker was reached
    pub stopped: bool,
}

/// Diff one share directory level against its destination listing.
pub fn plan(
    policy: &DiffPolicy,
    share_entries: &[ShareEntry],
    dest_entries: &[DriveEntry],
) -> SavePlan {
    let mut out = SavePlan::default();

    for share_entry in share_entries {
        if let Some(save_name) = policy.derive_name(share_entry) {
            let existing = dest_entries.iter().find(|dest| {
                policy.names_equal(&dest.file_name, &share_entry.file_name, share_entry.dir)
                    || policy.names_equal(&dest.file_name, &save_name, share_entry.dir)
            });

            match existing {
                None => out.saves.push(PlannedSave {
                    entry: share_entry.clone(),
                    save_name,
                }),
                Some(dest) if share_entry.dir && policy.recurses() => {
                    out.recursions.push(RecurseTarget {
                        share_fid: share_entry.fid.clone(),
                        dir_name: share_entry.file_name.clone(),
                        dest_fid: dest.fid.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if policy.stop_fid.as_deref() == Some(share_entry.fid.as_str()) {
            out.stopped = true;
            break;
        }
    }

    out
}
