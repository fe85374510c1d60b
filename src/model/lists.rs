use super::task::Task;

/// The two task collections that make up the persisted state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskLists {
    /// Not-yet-completed tasks, in display sequence order
    pub active: Vec<Task>,
    /// Completed tasks, most recently completed first
    pub completed: Vec<Task>,
}

impl TaskLists {
    pub fn new(active: Vec<Task>, completed: Vec<Task>) -> Self {
        TaskLists { active, completed }
    }

    /// Find a task in either collection
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.active
            .iter()
            .chain(self.completed.iter())
            .find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.completed.is_empty()
    }
}
