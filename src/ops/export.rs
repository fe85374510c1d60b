use chrono::NaiveDate;

use crate::model::task::Task;
use crate::ops::task_ops::group_by_category;

/// Text used when there is nothing to export
pub const EMPTY_EXPORT: &str = "No tasks to export.";

/// Render tasks as a markdown checklist grouped by category.
///
/// Groups appear in order of first appearance and are separated by a blank
/// line; tasks keep their sequence order.
pub fn format_checklist(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return EMPTY_EXPORT.to_string();
    }
    group_by_category(tasks)
        .into_iter()
        .map(|(category, group)| {
            let mut lines = vec![format!("## {}", category)];
            lines.extend(group.iter().map(|task| {
                format!(
                    "- [{}] {} (Priority: {})",
                    if task.completed { 'x' } else { ' ' },
                    task.title,
                    task.priority
                )
            }));
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Default file name for an export made on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("taskwise_{}.md", date.format("%Y-%m-%d"))
}
