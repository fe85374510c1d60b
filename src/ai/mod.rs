//! AI collaborators: task generation and natural-language re-categorization.
//!
//! The store never talks to a model directly. Operations in `ops::generate`
//! and `ops::adjust` take these traits, so tests can swap in fakes and the
//! CLI plugs in [`http::HttpAssistant`].

pub mod http;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for calls to a model
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("model service unavailable: {0}")]
    Unavailable(String),
    #[error("model request timed out after {0}s")]
    Timeout(u64),
    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned a malformed response: {0}")]
    Malformed(String),
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("no API key: set the {0} environment variable")]
    MissingApiKey(String),
}

impl AiError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, AiError::Unavailable(_))
    }
}

/// One item of a generated task list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTask {
    pub task: String,
    #[serde(default)]
    pub category: String,
    /// Suggested rank; 1 is most important
    #[serde(default = "default_generated_priority")]
    pub priority: f64,
}

fn default_generated_priority() -> f64 {
    1.0
}

/// Generation output: `{"taskList": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTaskList {
    #[serde(rename = "taskList")]
    pub task_list: Vec<GeneratedTask>,
}

/// The minimal view of a task sent for re-categorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProjection {
    pub id: String,
    pub title: String,
    pub category: String,
}

/// Input of a category adjustment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    #[serde(rename = "taskList")]
    pub task_list: Vec<TaskProjection>,
    pub instructions: String,
}

/// A category assignment returned by the adjuster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub category: String,
}

impl CategoryAssignment {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        CategoryAssignment {
            id: id.into(),
            title: String::new(),
            category: category.into(),
        }
    }
}

/// Expands a free-text goal into a categorized, prioritized task list
#[async_trait]
pub trait TaskGenerator: Send + Sync {
    async fn generate(&self, description: &str) -> Result<Vec<GeneratedTask>, AiError>;
}

/// Re-categorizes tasks following free-text instructions
#[async_trait]
pub trait CategoryAdjuster: Send + Sync {
    async fn adjust(&self, request: &AdjustmentRequest) -> Result<Vec<CategoryAssignment>, AiError>;
}
