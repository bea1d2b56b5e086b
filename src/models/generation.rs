// Generation history data models
use serde::{Deserialize, Serialize};

/// Result shown in history until the vendor task finishes.
pub const PLACEHOLDER_RESULT: &str = "/images/placeholder.png";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub timestamp: String,
    pub target_image: String,
    pub source_image_name: Option<String>,
    pub task_id: String,
    pub result_image: String,
    pub status: GenerationStatus,
    pub updated_at: Option<String>,
}

impl GenerationRecord {
    /// Optimistic record created at submission time, before any result
    /// exists. The placeholder is swapped out by a later update.
    pub fn new(
        user_id: String,
        user_email: Option<String>,
        target_image: String,
        source_image_name: Option<String>,
        task_id: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            user_email,
            timestamp: chrono::Utc::now().to_rfc3339(),
            target_image,
            source_image_name,
            task_id,
            result_image: PLACEHOLDER_RESULT.to_string(),
            status: GenerationStatus::Processing,
            updated_at: None,
        }
    }
}

/// Partial update applied when a task reaches a terminal state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationPatch {
    pub result_image: Option<String>,
    pub status: Option<GenerationStatus>,
}
