use crate::model::task::Task;

/// Result of a retention sweep over completed tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepResult {
    /// Completed tasks still inside the retention window, in stored order
    pub kept: Vec<Task>,
    /// Number of tasks dropped
    pub expired: usize,
}

/// Partition completed tasks into kept and expired.
///
/// A task is kept iff it has a completion time and
/// `now - completed_at < window`. Tasks without a completion time are
/// treated as expired.
pub fn sweep(completed: Vec<Task>, now_millis: i64, window_millis: i64) -> SweepResult {
    let mut result = SweepResult::default();
    for task in completed {
        match task.completed_at {
            Some(at) if now_millis.saturating_sub(at) < window_millis => result.kept.push(task),
            _ => result.expired += 1,
        }
    }
    result
}

/// One-line summary of a sweep, or `None` when nothing was dropped
pub fn sweep_notice(expired: usize, retention_days: u32) -> Option<String> {
    if expired == 0 {
        return None;
    }
    let plural = if expired == 1 { "" } else { "s" };
    Some(format!(
        "{} completed task{} older than {} days {} been removed.",
        expired,
        plural,
        retention_days,
        if expired == 1 { "has" } else { "have" }
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 24 * 60 * 60 * 1000;
    const WEEK: i64 = 7 * DAY;
    const NOW: i64 = 1_750_000_000_000;

    fn done(id: &str, completed_at: Option<i64>) -> Task {
        let mut task = Task::new(id.into(), id.into(), "Plan".into(), 1);
        task.completed = true;
        task.completed_at = completed_at;
        task
    }

    #[test]
    fn test_retention_boundary() {
        let tasks = vec![
            done("inside", Some(NOW - WEEK + 1)),
            done("outside", Some(NOW - WEEK - 1)),
            done("exact", Some(NOW - WEEK)),
            done("missing", None),
        ];
        let result = sweep(tasks, NOW, WEEK);
        let kept: Vec<&str> = result.kept.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(kept, vec!["inside"]);
        assert_eq!(result.expired, 3);
    }

    #[test]
    fn test_keeps_order_and_future_timestamps() {
        let tasks = vec![
            done("a", Some(NOW - DAY)),
            done("b", Some(NOW + DAY)),
            done("c", Some(NOW)),
        ];
        let result = sweep(tasks, NOW, WEEK);
        let kept: Vec<&str> = result.kept.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(kept, vec!["a", "b", "c"]);
        assert_eq!(result.expired, 0);
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(sweep_notice(0, 7), None);
        assert_eq!(
            sweep_notice(1, 7).as_deref(),
            Some("1 completed task older than 7 days has been removed.")
        );
        assert_eq!(
            sweep_notice(3, 7).as_deref(),
            Some("3 completed tasks older than 7 days have been removed.")
        );
    }
}
