//! The task store: the in-memory task lists bound to a persistence port.
//!
//! [`TaskStore::open`] loads both collections and runs the retention sweep,
//! writing back only when the sweep removed something. Every mutation after
//! that flushes through the same port, unless a slot failed to read at open. Mutations never fail; a failed write is logged and kept for
//! the caller in [`TaskStore::take_save_error`].

use std::sync::Arc;

use crate::ai::CategoryAssignment;
use crate::io::kv::{KeyValueStore, StorageError};
use crate::io::persistence::{LoadedLists, load_lists, save_lists};
use crate::model::config::RetentionConfig;
use crate::model::lists::TaskLists;
use crate::model::task::{Task, TaskDraft, TaskPatch};
use crate::ops::adjust::merge_categories;
use crate::ops::reorder;
use crate::ops::retention::{self, SweepResult};
use crate::ops::task_ops::{self, UpdateOutcome};
use crate::util::clock::Clock;

/// Summary of what happened when the store was opened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenReport {
    /// Completed tasks dropped by the retention sweep
    pub expired: usize,
    /// User-facing summary of the sweep, if anything was dropped
    pub notice: Option<String>,
    /// Slots that failed to read; the store will not write over them
    pub unreadable: Vec<String>,
}

pub struct TaskStore {
    lists: TaskLists,
    storage: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    save_error: Option<StorageError>,
    unreadable: Vec<&'static str>,
}

impl TaskStore {
    /// Load state from `storage` and drop completed tasks older than the
    /// retention window. Storage is written only if the sweep dropped
    /// something.
    pub fn open(
        storage: Box<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        retention: &RetentionConfig,
    ) -> (Self, OpenReport) {
        let LoadedLists { lists, unreadable } = load_lists(storage.as_ref());
        let TaskLists { active, completed } = lists;
        let SweepResult { kept, expired } =
            retention::sweep(completed, clock.now_millis(), retention.window_millis());

        let notice = retention::sweep_notice(expired, retention.days);
        if let Some(ref msg) = notice {
            tracing::info!(expired, "{}", msg);
        }
        tracing::debug!(active = active.len(), completed = kept.len(), "task store opened");

        let mut store = TaskStore {
            lists: TaskLists::new(active, kept),
            storage,
            clock,
            save_error: None,
            unreadable,
        };
        if expired > 0 {
            store.persist();
        }
        let unreadable = store.unreadable.iter().map(|key| key.to_string()).collect();
        (
            store,
            OpenReport {
                expired,
                notice,
                unreadable,
            },
        )
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn active(&self) -> &[Task] {
        &self.lists.active
    }

    pub fn completed(&self) -> &[Task] {
        &self.lists.completed
    }

    pub fn lists(&self) -> &TaskLists {
        &self.lists
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.lists.find(id)
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// The error from the most recent failed flush, if any
    pub fn take_save_error(&mut self) -> Option<StorageError> {
        self.save_error.take()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Replace the active collection (after generation)
    pub fn set_all(&mut self, tasks: Vec<Task>) {
        task_ops::set_all(&mut self.lists, tasks);
        self.persist();
    }

    /// Add a task with a fresh id. Returns the id, or `None` for a blank title.
    pub fn add(&mut self, draft: TaskDraft) -> Option<String> {
        let id = task_ops::add_task(&mut self.lists, draft, new_task_id())?;
        self.persist();
        Some(id)
    }

    pub fn update(&mut self, id: &str, patch: &TaskPatch) -> UpdateOutcome {
        let outcome = task_ops::update_task(&mut self.lists, id, patch, self.clock.now_millis());
        if outcome != UpdateOutcome::NotFound {
            self.persist();
        }
        outcome
    }

    /// Change a task's title in either collection. A blank title is discarded.
    pub fn edit_title(&mut self, id: &str, title: &str) -> UpdateOutcome {
        let outcome = task_ops::edit_title(&mut self.lists, id, title);
        if outcome != UpdateOutcome::NotFound {
            self.persist();
        }
        outcome
    }

    /// Delete from both collections. Idempotent.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = task_ops::remove_task(&mut self.lists, id);
        if removed {
            self.persist();
        }
        removed
    }

    pub fn rename_category(&mut self, old: &str, new: &str) -> usize {
        let count = task_ops::rename_category(&mut self.lists, old, new);
        if count > 0 {
            self.persist();
        }
        count
    }

    /// Drag `dragged_id` before `target_id` (or to the end) in `target_category`
    pub fn reorder(&mut self, dragged_id: &str, target_id: Option<&str>, target_category: &str) {
        let reordered = reorder::reorder(&self.lists.active, dragged_id, target_id, target_category);
        if reordered != self.lists.active {
            self.lists.active = reordered;
            self.persist();
        }
    }

    /// Merge category assignments returned by the adjuster. Returns the
    /// number of tasks whose category changed.
    pub fn apply_category_assignments(&mut self, assignments: &[CategoryAssignment]) -> usize {
        let changed = merge_categories(&mut self.lists.active, assignments);
        self.persist();
        changed
    }

    fn persist(&mut self) {
        if let Some(key) = self.unreadable.first() {
            tracing::error!(key, "refusing to overwrite tasks that could not be read");
            self.save_error = Some(StorageError::Unreadable { key: key.to_string() });
            return;
        }
        if let Err(e) = save_lists(self.storage.as_mut(), &self.lists) {
            tracing::error!(error = %e, "failed to save tasks");
            self.save_error = Some(e);
        }
    }
}

fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::kv::MemoryStore;
    use crate::io::persistence::{ACTIVE_KEY, COMPLETED_KEY};
    use crate::ops::reorder::is_normalized;
    use crate::util::clock::FixedClock;

    const DAY: i64 = 24 * 60 * 60 * 1000;
    const NOW: i64 = 1_750_000_000_000;

    /// Storage whose writes always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::WriteError {
                path: key.into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn open(handle: &MemoryStore) -> (TaskStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(NOW));
        let (store, _) = TaskStore::open(Box::new(handle.clone()), clock.clone(), &RetentionConfig::default());
        (store, clock)
    }

    /// Storage whose active slot cannot be read
    struct UnreadableActive(MemoryStore);

    impl KeyValueStore for UnreadableActive {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if key == ACTIVE_KEY {
                return Err(StorageError::ReadError {
                    path: key.into(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set(key, value)
        }
    }

    #[test]
    fn test_open_sweeps_and_flushes() {
        let completed = format!(
            r#"[{{"id":"new","title":"Recent","completed":true,"completedAt":{}}},
                {{"id":"old","title":"Stale","completed":true,"completedAt":{}}},
                {{"id":"bad","title":"No stamp","completed":true}}]"#,
            NOW - DAY,
            NOW - 8 * DAY
        );
        let handle = MemoryStore::new().with(COMPLETED_KEY, &completed);
        let clock = Arc::new(FixedClock::new(NOW));
        let (store, report) = TaskStore::open(Box::new(handle.clone()), clock, &RetentionConfig::default());

        assert_eq!(report.expired, 2);
        assert_eq!(
            report.notice.as_deref(),
            Some("2 completed tasks older than 7 days have been removed.")
        );
        assert_eq!(store.completed().len(), 1);
        assert_eq!(store.completed()[0].id, "new");
        // Swept state is written back
        assert!(!handle.slot(COMPLETED_KEY).unwrap().contains("Stale"));
        assert_eq!(handle.slot(ACTIVE_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn test_open_without_expiry_does_not_write() {
        let handle = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(NOW));
        let (store, report) = TaskStore::open(Box::new(handle.clone()), clock, &RetentionConfig::default());
        assert_eq!(report.expired, 0);
        assert!(store.active().is_empty());
        assert_eq!(handle.slot(ACTIVE_KEY), None);
        assert_eq!(handle.slot(COMPLETED_KEY), None);
    }

    #[test]
    fn test_unreadable_slot_is_never_overwritten() {
        let completed = format!(
            r#"[{{"id":"old","title":"Stale","completed":true,"completedAt":{}}}]"#,
            NOW - 8 * DAY
        );
        let handle = MemoryStore::new()
            .with(ACTIVE_KEY, "kept bytes")
            .with(COMPLETED_KEY, &completed);
        let clock = Arc::new(FixedClock::new(NOW));
        let (mut store, report) = TaskStore::open(
            Box::new(UnreadableActive(handle.clone())),
            clock,
            &RetentionConfig::default(),
        );

        assert_eq!(report.expired, 1);
        assert_eq!(report.unreadable, vec![ACTIVE_KEY.to_string()]);
        assert!(matches!(
            store.take_save_error(),
            Some(StorageError::Unreadable { .. })
        ));
        assert!(store.add(TaskDraft::new("New", "X")).is_some());
        assert!(matches!(
            store.take_save_error(),
            Some(StorageError::Unreadable { .. })
        ));
        assert_eq!(handle.slot(ACTIVE_KEY).as_deref(), Some("kept bytes"));
        assert!(handle.slot(COMPLETED_KEY).unwrap().contains("Stale"));
    }

    #[test]
    fn test_mutations_are_flushed() {
        let handle = MemoryStore::new();
        let (mut store, _) = open(&handle);
        let id = store.add(TaskDraft::new("Write tests", "Build")).unwrap();
        assert!(handle.slot(ACTIVE_KEY).unwrap().contains("Write tests"));

        store.update(&id, &TaskPatch::completed(true));
        assert_eq!(handle.slot(ACTIVE_KEY).as_deref(), Some("[]"));
        assert!(handle.slot(COMPLETED_KEY).unwrap().contains(&format!("\"completedAt\":{}", NOW)));

        let (reopened, _) = open(&handle);
        assert_eq!(reopened.completed()[0].id, id);
    }

    #[test]
    fn test_completion_round_trip_keeps_fields() {
        let handle = MemoryStore::new();
        let (mut store, clock) = open(&handle);
        store.add(TaskDraft::new("Third", "Plan"));
        store.add(TaskDraft::new("Second", "Plan"));
        let id = store.add(TaskDraft::new("First", "Plan")).unwrap();
        let before = store.find(&id).cloned().unwrap();

        assert_eq!(store.update(&id, &TaskPatch::completed(true)), UpdateOutcome::Completed);
        clock.advance(DAY);
        assert_eq!(store.update(&id, &TaskPatch::completed(false)), UpdateOutcome::Reopened);

        let after = store.find(&id).cloned().unwrap();
        assert_eq!(after, before);
        assert!(after.completed_at.is_none());
        assert!(store.completed().is_empty());
    }

    #[test]
    fn test_add_generates_unique_ids() {
        let handle = MemoryStore::new();
        let (mut store, _) = open(&handle);
        let a = store.add(TaskDraft::new("A", "X")).unwrap();
        let b = store.add(TaskDraft::new("B", "X")).unwrap();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
        assert_eq!(store.add(TaskDraft::new(" ", "X")), None);
    }

    #[test]
    fn test_reorder_through_store_keeps_ranks() {
        let handle = MemoryStore::new();
        let (mut store, _) = open(&handle);
        let b1 = store.add(TaskDraft::new("B1", "Build")).unwrap();
        let p2 = store.add(TaskDraft::new("P2", "Plan")).unwrap();
        let _p1 = store.add(TaskDraft::new("P1", "Plan")).unwrap();

        store.reorder(&p2, Some(&b1), "Build");
        let build: Vec<(&str, u32)> = store
            .active()
            .iter()
            .filter(|t| t.category == "Build")
            .map(|t| (t.title.as_str(), t.priority))
            .collect();
        assert_eq!(build, vec![("P2", 1), ("B1", 2)]);
        assert!(is_normalized(store.active()));
    }

    #[test]
    fn test_save_failure_is_kept_not_raised() {
        let clock = Arc::new(FixedClock::new(NOW));
        let (mut store, _) = TaskStore::open(Box::new(BrokenStore), clock, &RetentionConfig::default());
        assert!(store.take_save_error().is_none());
        assert!(store.add(TaskDraft::new("Still works", "X")).is_some());
        assert_eq!(store.active().len(), 1);
        assert!(store.take_save_error().is_some());
        assert!(store.take_save_error().is_none());
    }

    #[test]
    fn test_edit_title_persists_unless_unknown() {
        let handle = MemoryStore::new();
        let (mut store, _) = open(&handle);
        let id = store.add(TaskDraft::new("Draft", "Write")).unwrap();

        assert_eq!(store.edit_title(&id, "  Final draft "), UpdateOutcome::Updated);
        assert!(handle.slot(ACTIVE_KEY).unwrap().contains("\"Final draft\""));
        assert_eq!(store.edit_title("missing", "x"), UpdateOutcome::NotFound);
    }
}
