// Presentation-facing request/response envelopes
//
// Thin mapping layer between engine results and the JSON bodies a host
// HTTP surface answers with. Business failures keep `success: false`
// plus the matching HTTP status; there is deliberately no transport
// code here.

use serde::Serialize;

use crate::client::TaskStatus;
use crate::error::SwapError;

#[derive(Debug, Serialize)]
pub struct SubmitEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct StatusEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

/// Maps a submission outcome to (HTTP status, body).
pub fn submit_response(result: Result<String, SwapError>) -> (u16, SubmitEnvelope) {
    match result {
        Ok(task_id) => (
            200,
            SubmitEnvelope {
                success: true,
                task_id: Some(task_id),
                error: None,
                code: None,
            },
        ),
        Err(e) => {
            let status = e.status_code();
            (
                status,
                SubmitEnvelope {
                    success: false,
                    task_id: None,
                    error: Some(e.to_string()),
                    code: Some(status),
                },
            )
        }
    }
}

/// Maps a status-check outcome to (HTTP status, body).
pub fn status_response(result: Result<TaskStatus, SwapError>) -> (u16, StatusEnvelope) {
    match result {
        Ok(status) => (
            200,
            StatusEnvelope {
                success: true,
                data: Some(status),
                error: None,
                code: None,
            },
        ),
        Err(e) => {
            let status = e.status_code();
            (
                status,
                StatusEnvelope {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                    code: Some(status),
                },
            )
        }
    }
}

/// 400 answer for a request missing a required field, e.g. the task id
/// on a status check.
pub fn missing_field(name: &str) -> (u16, SubmitEnvelope) {
    (
        400,
        SubmitEnvelope {
            success: false,
            task_id: None,
            error: Some(format!("Missing required field: {}", name)),
            code: Some(400),
        },
    )
}
