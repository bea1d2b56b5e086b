// Vendor response normalization
//
// The vendor answers in one of two shapes depending on gateway version:
// an envelope `{ "code": 200, "data": { ... } }` or the payload at the
// top level. Both are modeled explicitly and collapsed by one
// normalization function per endpoint.

use serde::Deserialize;

use crate::models::TaskState;

// ---------- task creation ----------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreateTaskResponse {
    Enveloped { code: i64, data: CreateTaskData },
    Flat(FlatTaskId),
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskData {
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlatTaskId {
    pub id: Option<String>,
    pub task_id: Option<String>,
}

/// Pulls the task id out of either creation shape. Empty strings count
/// as absent.
pub fn extract_task_id(response: &CreateTaskResponse) -> Option<String> {
    let id = match response {
        CreateTaskResponse::Enveloped { data, .. } => data.task_id.clone(),
        CreateTaskResponse::Flat(flat) => flat.id.clone().or_else(|| flat.task_id.clone()),
    };
    id.filter(|s| !s.is_empty())
}

// ---------- task status ----------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StatusResponse {
    Enveloped { code: i64, data: StatusPayload },
    Flat(StatusPayload),
}

impl StatusResponse {
    pub fn into_payload(self) -> StatusPayload {
        match self {
            StatusResponse::Enveloped { data, .. } => data,
            StatusResponse::Flat(payload) => payload,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StatusPayload {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<TaskOutput>,
    #[serde(default)]
    pub error: Option<VendorError>,
}

/// Task output arrives either as a bare URL string or as an object
/// carrying `image_url`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskOutput {
    Url(String),
    Detail(OutputDetail),
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputDetail {
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Vendor errors arrive as a bare message or as `{ message, code }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VendorError {
    Message(String),
    Detail {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<i64>,
    },
}

pub fn vendor_error_message(error: &VendorError) -> Option<String> {
    match error {
        VendorError::Message(m) if !m.is_empty() => Some(m.clone()),
        VendorError::Message(_) => None,
        VendorError::Detail { message, .. } => {
            message.clone().filter(|m| !m.is_empty())
        }
    }
}

/// Object form wins over the string form; an empty URL is treated as no
/// result at all so the caller can fail the task.
pub fn resolve_result_url(output: Option<&TaskOutput>) -> Option<String> {
    let url = match output? {
        TaskOutput::Detail(detail) => detail.image_url.clone(),
        TaskOutput::Url(url) => Some(url.clone()),
    };
    url.filter(|u| !u.is_empty())
}

/// Status the rest of the engine works with, collapsed from whichever
/// wire shape arrived.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskStatus {
    pub state: TaskState,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

pub fn normalize_status(payload: StatusPayload) -> TaskStatus {
    let state = payload
        .status
        .as_deref()
        .map(TaskState::from_word)
        .unwrap_or(TaskState::Unknown(String::new()));
    let result_url = resolve_result_url(payload.output.as_ref());
    let error = payload.error.as_ref().and_then(vendor_error_message);
    TaskStatus { state, result_url, error }
}

/// Messages mentioning upload size get routed to the oversized-image
/// error so the UI can suggest compression.
pub fn is_size_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("image size") || lower.contains("too large") || lower.contains("maximum is")
}
