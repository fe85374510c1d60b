use std::fmt::Write;

use super::AdjustmentRequest;

pub const GENERATION_SYSTEM: &str = "You are a task management expert. \
Break the user's project or goal into concrete tasks. Group them into categories \
such as planning, research, execution, review and deployment, and rank the tasks \
inside each category so that priority 1 is the most important and should be done first. \
Reply with a JSON object of the form \
{\"taskList\": [{\"task\": string, \"category\": string, \"priority\": number}]}.";

pub const ADJUSTMENT_SYSTEM: &str = "You re-categorize task lists. \
Apply the user's instructions to the categories of the tasks you are given. \
Keep every task id and title unchanged. \
Reply with a JSON object of the form \
{\"tasks\": [{\"id\": string, \"title\": string, \"category\": string}]}.";

/// User message for task generation
pub fn generation_prompt(description: &str) -> String {
    format!("Description: {}", description.trim())
}

/// User message for category adjustment
pub fn adjustment_prompt(request: &AdjustmentRequest) -> String {
    let mut out = String::from("Task list:\n");
    for task in &request.task_list {
        let _ = writeln!(
            out,
            "- ID: {}, Title: {}, Category: {}",
            task.id, task.title, task.category
        );
    }
    let _ = write!(out, "\nInstructions: {}", request.instructions.trim());
    out
}
