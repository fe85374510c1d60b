use crate::io::kv::{KeyValueStore, StorageError};
use crate::model::lists::TaskLists;
use crate::model::task::Task;

/// Slot holding the active task list
pub const ACTIVE_KEY: &str = "active-tasks";
/// Slot holding the completed task list
pub const COMPLETED_KEY: &str = "completed-tasks";

/// Both collections as loaded, plus the slots that could not be read
#[derive(Debug, Default)]
pub struct LoadedLists {
    pub lists: TaskLists,
    /// Slots that exist but failed to read; they load as empty
    pub unreadable: Vec<&'static str>,
}

/// Load both collections. A missing or unparseable slot loads as an empty
/// list; an unreadable one also loads empty and is reported.
pub fn load_lists(store: &dyn KeyValueStore) -> LoadedLists {
    let mut loaded = LoadedLists::default();
    for key in [ACTIVE_KEY, COMPLETED_KEY] {
        let tasks = match load_slot(store, key) {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not read stored tasks; leaving the slot untouched");
                loaded.unreadable.push(key);
                Vec::new()
            }
        };
        if key == ACTIVE_KEY {
            loaded.lists.active = tasks;
        } else {
            loaded.lists.completed = tasks;
        }
    }
    loaded
}

fn load_slot(store: &dyn KeyValueStore, key: &str) -> Result<Vec<Task>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => Ok(tasks),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored tasks are malformed; starting empty");
            Ok(Vec::new())
        }
    }
}

/// Write both collections, active first.
pub fn save_lists(store: &mut dyn KeyValueStore, lists: &TaskLists) -> Result<(), StorageError> {
    save_slot(store, ACTIVE_KEY, &lists.active)?;
    save_slot(store, COMPLETED_KEY, &lists.completed)
}

fn save_slot(store: &mut dyn KeyValueStore, key: &str, tasks: &[Task]) -> Result<(), StorageError> {
    let content = serde_json::to_string(tasks).map_err(|e| StorageError::SerializeError {
        key: key.to_string(),
        source: e,
    })?;
    store.set(key, &content)
}
