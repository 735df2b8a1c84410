use chrono::NaiveDate;

use super::day_record::{DayRecord, TaskMap};
use super::task::Task;

/// In-memory view of the active day's record.
///
/// Mutators are synchronous and return whether state changed; the caller
/// is responsible for persisting the snapshot of a successful mutation.
/// Validation rejections (blank titles, no-op renames) report `false`
/// and leave the ledger untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub date: NaiveDate,
    pub tasks: TaskMap,
    pub categories: Vec<String>,
}

impl Ledger {
    pub fn new(date: NaiveDate) -> Self {
        let record = DayRecord::default();
        Self {
            date,
            tasks: record.tasks,
            categories: record.categories,
        }
    }

    /// Snapshot of the current `{tasks, categories}` pair for persistence.
    pub fn record(&self) -> DayRecord {
        DayRecord {
            tasks: self.tasks.clone(),
            categories: self.categories.clone(),
        }
    }

    /// Replace local state with a record pushed from the store.
    pub fn apply_remote(&mut self, record: DayRecord) {
        self.tasks = record.tasks;
        self.categories = record.categories;
    }

    /// Reset tasks and categories to the default pair of empty categories.
    pub fn reset_record(&mut self) {
        self.apply_remote(DayRecord::default());
    }

    /// Flip `done` on the task at `index` in `category`. No-op when the
    /// category or index doesn't exist.
    pub fn toggle_task(&mut self, category: &str, index: usize) -> bool {
        match self.tasks.get_mut(category).and_then(|seq| seq.get_mut(index)) {
            Some(task) => {
                task.toggle();
                true
            }
            None => false,
        }
    }

    /// Append a task to `category`, creating the sequence if absent.
    /// Blank titles are rejected; the stored title is trimmed.
    pub fn add_task(&mut self, category: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        self.tasks
            .entry(category.to_string())
            .or_default()
            .push(Task::new(title));
        true
    }

    /// Replace the title of the task at `index`, preserving its `done`
    /// state and id. Blank titles abandon the edit.
    pub fn edit_task_text(&mut self, category: &str, index: usize, new_title: &str) -> bool {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return false;
        }
        match self.tasks.get_mut(category).and_then(|seq| seq.get_mut(index)) {
            Some(task) => {
                task.title = new_title.to_string();
                true
            }
            None => false,
        }
    }

    /// Move `old_name`'s task sequence to `new_name`, keeping the
    /// category's position in the display order. Rejected when the new
    /// name is blank, unchanged, or `old_name` isn't a known category.
    pub fn rename_category(&mut self, old_name: &str, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == old_name {
            return false;
        }
        let Some(pos) = self.categories.iter().position(|c| c == old_name) else {
            return false;
        };
        let seq = self.tasks.remove(old_name).unwrap_or_default();
        self.tasks.insert(new_name.to_string(), seq);
        self.categories[pos] = new_name.to_string();
        true
    }

    /// Remove the task at `index`, shifting later tasks' positional
    /// identity down by one.
    pub fn delete_task(&mut self, category: &str, index: usize) -> bool {
        match self.tasks.get_mut(category) {
            Some(seq) if index < seq.len() => {
                seq.remove(index);
                true
            }
            _ => false,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}
