use indexmap::IndexMap;

use crate::model::lists::TaskLists;
use crate::model::task::{Task, TaskDraft, TaskPatch, display_category};
use crate::ops::reorder::{insert_ranked, normalize_priorities};

/// What an update actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Moved from active to completed
    Completed,
    /// Moved from completed back to active
    Reopened,
    /// Fields merged in place
    Updated,
    /// No task matched in the collection the patch applies to
    NotFound,
}

// ---------------------------------------------------------------------------
// Bulk replacement and creation
// ---------------------------------------------------------------------------

/// Replace the entire active collection. No validation, no new ids.
pub fn set_all(lists: &mut TaskLists, tasks: Vec<Task>) {
    lists.active = tasks;
}

/// Add a task built from `draft` under the given id.
///
/// Without an explicit priority the task is prepended to the active list;
/// with one it is inserted at that rank within its category. Returns `None`
/// (and changes nothing) if the title is blank.
pub fn add_task(lists: &mut TaskLists, draft: TaskDraft, id: String) -> Option<String> {
    let title = draft.title.trim();
    if title.is_empty() {
        return None;
    }
    let task = Task::new(
        id.clone(),
        title.to_string(),
        draft.category,
        draft.priority.unwrap_or(1).max(1),
    );
    match draft.priority {
        None => lists.active.insert(0, task),
        Some(_) => insert_ranked(&mut lists.active, task),
    }
    normalize_priorities(&mut lists.active);
    Some(id)
}

// ---------------------------------------------------------------------------
// Update dispatch
// ---------------------------------------------------------------------------

/// Apply a partial update.
///
/// - `completed: Some(true)` moves an active task to the front of the
///   completed list, stamped with `now_millis`.
/// - `completed: Some(false)` moves a completed task back to active at its
///   preserved rank, clearing the completion time.
/// - otherwise fields are merged wherever the task lives.
pub fn update_task(lists: &mut TaskLists, id: &str, patch: &TaskPatch, now_millis: i64) -> UpdateOutcome {
    match patch.completed {
        Some(true) => complete_task(lists, id, patch, now_millis),
        Some(false) => reopen_task(lists, id, patch),
        None => edit_task(lists, id, patch),
    }
}

fn complete_task(lists: &mut TaskLists, id: &str, patch: &TaskPatch, now_millis: i64) -> UpdateOutcome {
    let Some(idx) = lists.active.iter().position(|t| t.id == id) else {
        return UpdateOutcome::NotFound;
    };
    let mut task = lists.active.remove(idx);
    task.merge(patch);
    task.completed = true;
    task.completed_at = Some(now_millis);
    lists.completed.insert(0, task);
    normalize_priorities(&mut lists.active);
    UpdateOutcome::Completed
}

fn reopen_task(lists: &mut TaskLists, id: &str, patch: &TaskPatch) -> UpdateOutcome {
    let Some(idx) = lists.completed.iter().position(|t| t.id == id) else {
        return UpdateOutcome::NotFound;
    };
    let mut task = lists.completed.remove(idx);
    task.completed = false;
    task.completed_at = None;
    task.merge(patch);
    insert_ranked(&mut lists.active, task);
    normalize_priorities(&mut lists.active);
    UpdateOutcome::Reopened
}

fn edit_task(lists: &mut TaskLists, id: &str, patch: &TaskPatch) -> UpdateOutcome {
    if let Some(idx) = lists.active.iter().position(|t| t.id == id) {
        let old_category = lists.active[idx].display_category().to_string();
        lists.active[idx].merge(patch);
        let moved = lists.active[idx].display_category() != old_category;

        // Category or rank changes re-seat the task: an explicit priority
        // picks the rank, otherwise it goes to the end of its new category.
        if moved || patch.priority.is_some() {
            let mut task = lists.active.remove(idx);
            task.priority = patch.priority.unwrap_or(u32::MAX).max(1);
            insert_ranked(&mut lists.active, task);
            normalize_priorities(&mut lists.active);
        }
        return UpdateOutcome::Updated;
    }

    if let Some(task) = lists.completed.iter_mut().find(|t| t.id == id) {
        task.merge(patch);
        return UpdateOutcome::Updated;
    }

    UpdateOutcome::NotFound
}

/// Change a task's title. A blank title is discarded.
pub fn edit_title(lists: &mut TaskLists, id: &str, title: &str) -> UpdateOutcome {
    edit_task(lists, id, &TaskPatch::title(title))
}

// ---------------------------------------------------------------------------
// Removal and category rename
// ---------------------------------------------------------------------------

/// Delete a task from both collections. Returns whether anything was removed.
pub fn remove_task(lists: &mut TaskLists, id: &str) -> bool {
    let before = lists.active.len() + lists.completed.len();
    lists.active.retain(|t| t.id != id);
    lists.completed.retain(|t| t.id != id);
    let removed = lists.active.len() + lists.completed.len() != before;
    if removed {
        normalize_priorities(&mut lists.active);
    }
    removed
}

/// Rename a category on every active task currently in it.
///
/// Matching uses display labels, so renaming `Uncategorized` also picks up
/// tasks with a blank category. Priorities are not touched and completed
/// tasks keep the category they were completed under. Returns the number of
/// tasks renamed.
pub fn rename_category(lists: &mut TaskLists, old: &str, new: &str) -> usize {
    let new = new.trim();
    if new.is_empty() {
        return 0;
    }
    let old = display_category(old).to_string();
    let mut count = 0;
    for task in lists.active.iter_mut() {
        if task.display_category() == old {
            task.category = new.to_string();
            count += 1;
        }
    }
    count
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Group tasks by display category, in order of first appearance
pub fn group_by_category(tasks: &[Task]) -> IndexMap<&str, Vec<&Task>> {
    let mut groups: IndexMap<&str, Vec<&Task>> = IndexMap::new();
    for task in tasks {
        groups.entry(task.display_category()).or_default().push(task);
    }
    groups
}

/// Distinct display categories of the given tasks, in order of first appearance
pub fn categories(tasks: &[Task]) -> Vec<&str> {
    group_by_category(tasks).into_keys().collect()
}
