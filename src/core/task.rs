use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One to-do entry inside a category.
///
/// Display identity is positional (index within the category's ordered
/// sequence); `id` is a stable handle assigned at creation that survives
/// retitling. Records written by pre-id clients decode with a fresh id,
/// which is persisted on the next write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub done: bool,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            done: false,
        }
    }

    pub fn toggle(&mut self) {
        self.done = !self.done;
    }
}
