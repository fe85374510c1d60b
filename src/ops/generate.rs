use crate::ai::{AiError, GeneratedTask, TaskGenerator};
use crate::model::config::RetryConfig;
use crate::model::task::Task;
use crate::ops::reorder::normalize_priorities;

/// Error type for task generation
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("description is empty: describe your project or goal")]
    EmptyDescription,
    #[error("task generation failed: {0}")]
    Ai(#[from] AiError),
}

/// Call the generator, retrying transient failures with exponential backoff.
///
/// Waits `retry.delay_after(n)` after failed attempt `n`. Non-transient
/// errors, and the transient error of the final attempt, are returned as is.
pub async fn request_with_retry(
    generator: &dyn TaskGenerator,
    description: &str,
    retry: &RetryConfig,
) -> Result<Vec<GeneratedTask>, AiError> {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match generator.generate(description).await {
            Ok(tasks) => return Ok(tasks),
            Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                let delay = retry.delay_after(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "model unavailable, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempt = attempt + 1, error = %e, "task generation failed");
                return Err(e);
            }
        }
    }
}

/// Turn generated items into active tasks with fresh ids.
///
/// Blank items are skipped and priorities are rounded and clamped to at
/// least 1. The result is stably sorted by the suggested priority and then
/// ranked `1..n` per category, so ties keep the order the model gave them.
pub fn tasks_from_generated(items: Vec<GeneratedTask>, mut next_id: impl FnMut() -> String) -> Vec<Task> {
    let mut tasks: Vec<Task> = items
        .into_iter()
        .filter(|item| !item.task.trim().is_empty())
        .map(|item| {
            Task::new(
                next_id(),
                item.task.trim().to_string(),
                item.category.trim().to_string(),
                clamp_priority(item.priority),
            )
        })
        .collect();
    tasks.sort_by_key(|t| t.priority);
    normalize_priorities(&mut tasks);
    tasks
}

fn clamp_priority(raw: f64) -> u32 {
    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    raw.round().min(f64::from(u32::MAX)) as u32
}

/// Generate a task list from a free-text description.
/// A blank description is rejected without calling the generator.
pub async fn generate_tasks(
    generator: &dyn TaskGenerator,
    description: &str,
    retry: &RetryConfig,
) -> Result<Vec<Task>, GenerateError> {
    if description.trim().is_empty() {
        return Err(GenerateError::EmptyDescription);
    }
    let items = request_with_retry(generator, description, retry).await?;
    let tasks = tasks_from_generated(items, || uuid::Uuid::new_v4().to_string());
    tracing::info!(count = tasks.len(), "task list generated");
    Ok(tasks)
}
