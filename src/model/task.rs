use serde::{Deserialize, Serialize};

/// Display label for tasks with an empty category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A single task. Serialized with camelCase keys to match the stored layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque identifier, stable for the task's lifetime
    pub id: String,
    /// Task title text
    pub title: String,
    /// Free-text category label (may be empty)
    #[serde(default)]
    pub category: String,
    /// Rank within the task's category (1 = first)
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Checkbox state
    #[serde(default)]
    pub completed: bool,
    /// Completion time in epoch milliseconds; present iff `completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

fn default_priority() -> u32 {
    1
}

impl Task {
    /// Create a new active task
    pub fn new(id: String, title: String, category: String, priority: u32) -> Self {
        Task {
            id,
            title,
            category,
            priority,
            completed: false,
            completed_at: None,
        }
    }

    /// Category label used for grouping and ranking.
    /// An empty or blank category groups under `Uncategorized`.
    pub fn display_category(&self) -> &str {
        display_category(&self.category)
    }

    /// Apply the non-completion fields of a patch.
    /// A title that is blank after trimming is discarded.
    pub fn merge(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            let trimmed = title.trim();
            if !trimmed.is_empty() {
                self.title = trimmed.to_string();
            }
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority.max(1);
        }
    }
}

/// Normalize a raw category label for display grouping
pub fn display_category(category: &str) -> &str {
    if category.trim().is_empty() {
        UNCATEGORIZED
    } else {
        category
    }
}

/// Partial update for a task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub priority: Option<u32>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        TaskPatch {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        TaskPatch {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        TaskPatch {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn priority(priority: u32) -> Self {
        TaskPatch {
            priority: Some(priority),
            ..Default::default()
        }
    }
}

/// Fields for a task created by hand. The store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub category: String,
    /// Rank to insert at; `None` puts the task first
    pub priority: Option<u32>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            category: category.into(),
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }
}
