use std::collections::HashMap;

use crate::ai::{AdjustmentRequest, AiError, CategoryAdjuster, CategoryAssignment, TaskProjection};
use crate::model::task::Task;
use crate::ops::reorder::normalize_priorities;
use crate::store::TaskStore;

/// Error type for category adjustment
#[derive(Debug, thiserror::Error)]
pub enum AdjustError {
    #[error("no tasks to adjust")]
    NoTasks,
    #[error("adjustment instructions are empty")]
    EmptyInstructions,
    #[error("category adjustment failed: {0}")]
    Ai(#[from] AiError),
}

/// Result of a successful adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustOutcome {
    /// Assignments the adjuster returned
    pub returned: usize,
    /// Tasks whose category actually changed
    pub changed: usize,
}

/// Validate input and build the request sent to the adjuster.
/// Nothing is sent when there are no tasks or the instructions are blank.
pub fn prepare_adjustment(active: &[Task], instructions: &str) -> Result<AdjustmentRequest, AdjustError> {
    if active.is_empty() {
        return Err(AdjustError::NoTasks);
    }
    if instructions.trim().is_empty() {
        return Err(AdjustError::EmptyInstructions);
    }
    Ok(AdjustmentRequest {
        task_list: active
            .iter()
            .map(|t| TaskProjection {
                id: t.id.clone(),
                title: t.title.clone(),
                category: t.category.clone(),
            })
            .collect(),
        instructions: instructions.to_string(),
    })
}

/// Merge returned categories into the active list by id, then rank every
/// category by sequence order.
///
/// Tasks missing from `assignments` keep their category; assignments for ids
/// no longer present are ignored, as are blank categories. When an id
/// appears more than once the last assignment wins. Returns the number of
/// tasks whose category changed.
pub fn merge_categories(active: &mut [Task], assignments: &[CategoryAssignment]) -> usize {
    let updates: HashMap<&str, &str> = assignments
        .iter()
        .filter(|a| !a.category.trim().is_empty())
        .map(|a| (a.id.as_str(), a.category.as_str()))
        .collect();

    let mut changed = 0;
    for task in active.iter_mut() {
        if let Some(&category) = updates.get(task.id.as_str())
            && task.category != category
        {
            task.category = category.to_string();
            changed += 1;
        }
    }
    normalize_priorities(active);
    changed
}

/// Send a prepared request to the adjuster.
///
/// The request owns its copy of the tasks, so the store is free for other
/// mutations while the call is in flight. On failure nothing is merged.
pub async fn request_assignments(
    adjuster: &dyn CategoryAdjuster,
    request: &AdjustmentRequest,
) -> Result<Vec<CategoryAssignment>, AdjustError> {
    tracing::debug!(tasks = request.task_list.len(), "requesting category adjustment");
    let assignments = adjuster.adjust(request).await.inspect_err(|e| {
        tracing::warn!(error = %e, "category adjustment failed");
    })?;
    Ok(assignments)
}

/// Merge the adjuster's answer into the store's current active tasks
pub fn apply_assignments(store: &mut TaskStore, assignments: &[CategoryAssignment]) -> AdjustOutcome {
    let changed = store.apply_category_assignments(assignments);
    tracing::info!(returned = assignments.len(), changed, "categories adjusted");
    AdjustOutcome {
        returned: assignments.len(),
        changed,
    }
}
