use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::task::Task;

/// Category name -> ordered task sequence.
pub type TaskMap = HashMap<String, Vec<Task>>;

static DEFAULT_CATEGORIES: Lazy<Vec<String>> =
    Lazy::new(|| vec!["Category1".to_string(), "Category2".to_string()]);

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.clone()
}

fn default_task_map() -> TaskMap {
    DEFAULT_CATEGORIES
        .iter()
        .map(|name| (name.clone(), Vec::new()))
        .collect()
}

/// The date key used to address day records, `YYYY-MM-DD` in the user's
/// local calendar.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The persisted task state for one user on one calendar date.
///
/// `categories` controls display order; the map's own key order is never
/// trusted for that. Every name in `categories` is expected to have an
/// entry in `tasks`, which holds for records this crate writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(default = "default_task_map")]
    pub tasks: TaskMap,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl Default for DayRecord {
    fn default() -> Self {
        Self {
            tasks: default_task_map(),
            categories: default_categories(),
        }
    }
}

impl DayRecord {
    /// Decode a stored document, falling back to the default record when
    /// the document doesn't parse. Missing fields fall back per-field.
    pub fn from_document(doc: &crate::store::Document) -> Self {
        match serde_json::from_value(serde_json::Value::Object(doc.clone())) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("malformed day record, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_document(&self) -> crate::store::Document {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => unreachable!("day record always serializes to an object"),
        }
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_two_empty_categories() {
        let record = DayRecord::default();
        assert_eq!(record.categories, vec!["Category1", "Category2"]);
        assert_eq!(record.tasks.len(), 2);
        assert!(record.tasks["Category1"].is_empty());
        assert!(record.tasks["Category2"].is_empty());
    }

    #[test]
    fn decodes_legacy_document_and_assigns_ids() {
        let doc: crate::store::Document = serde_json::from_str(
            r#"{
                "tasks": {"Study": [{"title": "Read", "done": false}]},
                "categories": ["Study"]
            }"#,
        )
        .unwrap();
        let record = DayRecord::from_document(&doc);
        assert_eq!(record.categories, vec!["Study"]);
        assert_eq!(record.tasks["Study"][0].title, "Read");
        assert!(!record.tasks["Study"][0].id.is_nil());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let doc: crate::store::Document = serde_json::from_str(r#"{}"#).unwrap();
        let record = DayRecord::from_document(&doc);
        assert_eq!(record, DayRecord::default());
    }

    #[test]
    fn garbage_document_falls_back_to_defaults() {
        let doc: crate::store::Document =
            serde_json::from_str(r#"{"tasks": 42, "categories": "nope"}"#).unwrap();
        assert_eq!(DayRecord::from_document(&doc), DayRecord::default());
    }

    #[test]
    fn date_key_is_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(date_key(date), "2024-06-01");
    }
}
