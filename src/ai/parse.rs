use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{AiError, CategoryAssignment, GeneratedTask, GeneratedTaskList};

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fence regex"));

/// Strip markdown code fences and surrounding chatter, leaving the JSON payload
pub fn extract_json(raw: &str) -> &str {
    let body = match FENCE_RE.captures(raw).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => raw,
    };
    let trimmed = body.trim();
    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if s <= e => &trimmed[s..=e],
        _ => trimmed,
    }
}

/// Parse a generation response: `{"taskList": [...]}` or a bare array
pub fn parse_generated(raw: &str) -> Result<Vec<GeneratedTask>, AiError> {
    let json = extract_json(raw);
    if let Ok(list) = serde_json::from_str::<GeneratedTaskList>(json) {
        return Ok(list.task_list);
    }
    serde_json::from_str::<Vec<GeneratedTask>>(json).map_err(|e| AiError::Malformed(e.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AssignmentPayload {
    Bare(Vec<CategoryAssignment>),
    Wrapped { tasks: Vec<CategoryAssignment> },
    TaskList {
        #[serde(rename = "taskList")]
        task_list: Vec<CategoryAssignment>,
    },
}

/// Parse an adjustment response: a bare array, or one wrapped as
/// `{"tasks": [...]}` / `{"taskList": [...]}`
pub fn parse_assignments(raw: &str) -> Result<Vec<CategoryAssignment>, AiError> {
    let json = extract_json(raw);
    match serde_json::from_str::<AssignmentPayload>(json) {
        Ok(AssignmentPayload::Bare(list))
        | Ok(AssignmentPayload::Wrapped { tasks: list })
        | Ok(AssignmentPayload::TaskList { task_list: list }) => Ok(list),
        Err(e) => Err(AiError::Malformed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_fenced_json() {
        let raw = "Here you go:\n```json\n{\"taskList\": []}\n```\nGood luck!";
        assert_eq!(extract_json(raw), "{\"taskList\": []}");
    }

    #[test]
    fn test_extracts_unfenced_json_with_chatter() {
        let raw = "Sure! [{\"id\":\"1\",\"category\":\"A\"}] Hope that helps.";
        assert_eq!(extract_json(raw), "[{\"id\":\"1\",\"category\":\"A\"}]");
    }

    #[test]
    fn test_parses_generated_task_list() {
        let raw = r#"{"taskList":[{"task":"Pick a domain","category":"Planning","priority":1},{"task":"Write post","category":"Execution","priority":2.0}]}"#;
        let tasks = parse_generated(raw).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task, "Pick a domain");
        assert_eq!(tasks[1].priority, 2.0);
    }

    #[test]
    fn test_parses_bare_generated_array() {
        let tasks = parse_generated(r#"[{"task":"Only one"}]"#).unwrap();
        assert_eq!(tasks[0].category, "");
        assert_eq!(tasks[0].priority, 1.0);
    }

    #[test]
    fn test_malformed_generation_is_error() {
        assert!(matches!(
            parse_generated("I cannot help with that."),
            Err(AiError::Malformed(_))
        ));
    }

    #[test]
    fn test_parses_assignment_shapes() {
        let bare = r#"[{"id":"1","title":"T","category":"Z"}]"#;
        let wrapped = r#"{"tasks":[{"id":"1","title":"T","category":"Z"}]}"#;
        let task_list = r#"{"taskList":[{"id":"1","category":"Z"}]}"#;
        for raw in [bare, wrapped, task_list] {
            let list = parse_assignments(raw).unwrap();
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].id, "1");
            assert_eq!(list[0].category, "Z");
        }
    }

    #[test]
    fn test_assignment_missing_category_is_malformed() {
        assert!(matches!(
            parse_assignments(r#"[{"id":"1"}]"#),
            Err(AiError::Malformed(_))
        ));
    }
}
