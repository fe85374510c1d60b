use chrono::{DateTime, Local};
use serde::Serialize;

use crate::model::task::Task;
use crate::ops::task_ops::group_by_category;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub category: String,
    pub priority: u32,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Serialize)]
pub struct CategoryJson {
    pub category: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct AddedJson {
    pub id: String,
}

#[derive(Serialize)]
pub struct AdjustJson {
    pub returned: usize,
    pub changed: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        title: task.title.clone(),
        category: task.display_category().to_string(),
        priority: task.priority,
        completed: task.completed,
        completed_at: task
            .completed_at
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339()),
    }
}

/// Active tasks grouped by category, categories sorted by name
pub fn grouped_to_json(tasks: &[Task]) -> Vec<CategoryJson> {
    sorted_groups(tasks)
        .into_iter()
        .map(|(category, group)| CategoryJson {
            category: category.to_string(),
            tasks: group.into_iter().map(task_to_json).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// First 8 characters of an id, enough to address it from the CLI
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Format a completion time in local time
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Format a single active task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    format!("{:>3}. {}  ({})", task.priority, task.title, short_id(&task.id))
}

/// Groups sorted by category name, tasks by rank within each group
fn sorted_groups(tasks: &[Task]) -> Vec<(&str, Vec<&Task>)> {
    let mut groups: Vec<(&str, Vec<&Task>)> = group_by_category(tasks).into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(b.0));
    for (_, group) in &mut groups {
        group.sort_by_key(|t| t.priority);
    }
    groups
}

/// Format the active list grouped by category
pub fn format_grouped_listing(tasks: &[Task]) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["Your task list is empty. Try `tw generate <description>`.".to_string()];
    }
    let mut lines = Vec::new();
    for (i, (category, group)) in sorted_groups(tasks).into_iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!("## {}", category));
        lines.extend(group.into_iter().map(format_task_line));
    }
    lines
}

/// Format completed tasks, most recently completed first
pub fn format_completed_listing(tasks: &[Task]) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["No completed tasks.".to_string()];
    }
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|t| std::cmp::Reverse(t.completed_at.unwrap_or(0)));
    sorted
        .into_iter()
        .map(|task| {
            let when = task
                .completed_at
                .map(format_timestamp)
                .unwrap_or_else(|| "unknown".to_string());
            format!(
                "[x] {}  [{}] done {}  ({})",
                task.title,
                task.display_category(),
                when,
                short_id(&task.id)
            )
        })
        .collect()
}
