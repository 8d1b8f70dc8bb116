//! Task schedule predicate.

use chrono::{Datelike, NaiveDate};
use core_runtime::config::TaskConfig;
use tracing::warn;

/// Whether a task is eligible to run on `today`.
///
/// Eligible iff (no end date, or today ≤ end date) and (no weekday
/// restriction, or today's ISO weekday is in the set). An unparseable end
/// date is treated as absent rather than blocking the task forever.
pub fn is_due(task: &TaskConfig, today: NaiveDate) -> bool {
    if let Some(enddate) = &task.enddate {
        match NaiveDate::parse_from_str(enddate, "%Y-%m-%d") {
            Ok(end) => {
                if today > end {
                    return false;
                }
            }
            Err(_) => {
                warn!(taskname = %task.taskname, enddate = %enddate, "Unparseable enddate, ignoring");
            }
        }
    }

    if task.runweek.is_empty() {
        return true;
    }
    let weekday = today.weekday().number_from_monday() as u8;
    task.runweek.contains(&weekday)
}
