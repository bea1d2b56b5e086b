// Face-swap task data models
use serde::{Deserialize, Serialize};

/// Lifecycle phase of the current swap, as seen by the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwapPhase {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Vendor-side task state after status-word normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Processing,
    Staged,
    Completed,
    Failed,
    Unknown(String),
}

impl TaskState {
    /// Maps a raw vendor status word, case-insensitively. Unknown words
    /// are kept as-is so the poller can keep waiting on them.
    pub fn from_word(word: &str) -> Self {
        match word.to_lowercase().as_str() {
            "pending" => TaskState::Pending,
            "processing" => TaskState::Processing,
            "staged" => TaskState::Staged,
            "completed" => TaskState::Completed,
            "failed" => TaskState::Failed,
            other => TaskState::Unknown(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// The task currently tracked by the lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapTask {
    pub task_id: String,
    pub attempts: u32,
    pub result_url: Option<String>,
    pub error: Option<String>,
    pub history_id: Option<String>,
    pub created_at: String,
}

impl SwapTask {
    pub fn new(task_id: String) -> Self {
        Self {
            task_id,
            attempts: 0,
            result_url: None,
            error: None,
            history_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
