use std::collections::HashMap;

use crate::model::task::Task;

/// What the dragged task is currently hovering over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A task card: insert immediately before it, in its category
    Task { id: String, category: String },
    /// A category header with no specific task: append to that category
    CategoryHeader(String),
}

/// A resolved drag operation, ready for [`reorder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRequest {
    pub dragged_id: String,
    pub target_id: Option<String>,
    pub target_category: String,
}

/// Resolve a hover position into a reorder request.
/// Hovering over the dragged task itself yields no target.
pub fn resolve_drop(dragged_id: &str, over: &DropTarget) -> Option<ReorderRequest> {
    match over {
        DropTarget::Task { id, .. } if id == dragged_id => None,
        DropTarget::Task { id, category } => Some(ReorderRequest {
            dragged_id: dragged_id.to_string(),
            target_id: Some(id.clone()),
            target_category: category.clone(),
        }),
        DropTarget::CategoryHeader(category) => Some(ReorderRequest {
            dragged_id: dragged_id.to_string(),
            target_id: None,
            target_category: category.clone(),
        }),
    }
}

/// Move `dragged_id` into `target_category`, immediately before `target_id`
/// (or to the end of the list when there is no target or it is not found),
/// then rank every category by sequence order.
///
/// Returns the input unchanged if the dragged task does not exist or is
/// dropped onto itself.
pub fn reorder(
    tasks: &[Task],
    dragged_id: &str,
    target_id: Option<&str>,
    target_category: &str,
) -> Vec<Task> {
    let Some(from) = tasks.iter().position(|t| t.id == dragged_id) else {
        return tasks.to_vec();
    };
    if target_id == Some(dragged_id) {
        return tasks.to_vec();
    }

    let mut result = tasks.to_vec();
    let mut dragged = result.remove(from);
    dragged.category = target_category.to_string();

    let insert_at = target_id
        .and_then(|tid| result.iter().position(|t| t.id == tid))
        .unwrap_or(result.len());
    result.insert(insert_at, dragged);

    normalize_priorities(&mut result);
    result
}

/// Apply a resolved drag request
pub fn apply_request(tasks: &[Task], request: &ReorderRequest) -> Vec<Task> {
    reorder(
        tasks,
        &request.dragged_id,
        request.target_id.as_deref(),
        &request.target_category,
    )
}

/// Assign priorities `1..n` within every category, following sequence order.
/// Categories are keyed by their display label.
pub fn normalize_priorities(tasks: &mut [Task]) {
    let mut counters: HashMap<String, u32> = HashMap::new();
    for task in tasks.iter_mut() {
        let rank = counters
            .entry(task.display_category().to_string())
            .or_insert(0);
        *rank += 1;
        task.priority = *rank;
    }
}

/// Check that every category is ranked exactly `1..n` in sequence order
pub fn is_normalized(tasks: &[Task]) -> bool {
    let mut counters: HashMap<&str, u32> = HashMap::new();
    tasks.iter().all(|task| {
        let rank = counters.entry(task.display_category()).or_insert(0);
        *rank += 1;
        task.priority == *rank
    })
}

/// Insert `task` so that it takes its `priority` as rank within its category.
///
/// A rank past the end of the category appends after the category's last
/// member; a category with no members places the task first in the list.
/// Assumes the existing list is ranked; call [`normalize_priorities`] after.
pub fn insert_ranked(tasks: &mut Vec<Task>, task: Task) {
    let category = task.display_category();
    let rank = task.priority.max(1) as usize;
    let members: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.display_category() == category)
        .map(|(i, _)| i)
        .collect();

    let pos = match members.get(rank - 1) {
        Some(&i) => i,
        None => members.last().map(|&i| i + 1).unwrap_or(0),
    };
    tasks.insert(pos, task);
}
