use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::day_record::DayRecord;

/// Per-date completion summary used for calendar cell rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub remaining: usize,
    pub is_all_done: bool,
}

/// Date key (`YYYY-MM-DD`) -> summary, for every date with a stored record.
pub type SummaryMap = HashMap<String, DaySummary>;

/// Summarize one record: `remaining` counts not-done tasks across all
/// categories; a day with zero tasks is never all-done.
pub fn summarize(record: &DayRecord) -> DaySummary {
    let total = record.total_tasks();
    let remaining = record
        .tasks
        .values()
        .flatten()
        .filter(|t| !t.done)
        .count();
    DaySummary {
        remaining,
        is_all_done: total > 0 && remaining == 0,
    }
}

/// Rebuild the full summary map from a collection snapshot.
///
/// Deliberately recomputes from scratch on every invocation rather than
/// patching incrementally; the collection is small and full recomputation
/// cannot drift from the stored records.
pub fn compute_summaries(records: &[(String, DayRecord)]) -> SummaryMap {
    records
        .iter()
        .map(|(date, record)| (date.clone(), summarize(record)))
        .collect()
}
