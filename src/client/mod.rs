// PiAPI face-swap task client
pub mod response;

pub use response::TaskStatus;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, error};
use url::Url;

use crate::config::ApiConfig;
use crate::error::SwapError;
use crate::models::ProcessedImage;
use response::{
    extract_task_id, is_size_error, normalize_status, CreateTaskResponse, StatusResponse,
};

/// Where the target face image comes from: one of the hosted presets, or
/// bytes uploaded by the user.
#[derive(Debug, Clone)]
pub enum TargetImage {
    Url(String),
    Bytes { bytes: Vec<u8>, content_type: String },
}

impl TargetImage {
    /// Short label stored in history records.
    pub fn label(&self) -> String {
        match self {
            TargetImage::Url(url) => url.clone(),
            TargetImage::Bytes { content_type, .. } => format!("uploaded ({})", content_type),
        }
    }
}

/// Vendor operations the lifecycle manager depends on. Kept as a trait so
/// the poll loop can run against a scripted double.
pub trait TaskApi: Send + Sync {
    fn submit_task(&self, target: &TargetImage, source: &ProcessedImage)
        -> Result<String, SwapError>;
    fn fetch_status(&self, task_id: &str) -> Result<TaskStatus, SwapError>;
}

pub struct HttpTaskClient {
    config: ApiConfig,
}

impl HttpTaskClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

impl TaskApi for HttpTaskClient {
    fn submit_task(
        &self,
        target: &TargetImage,
        source: &ProcessedImage,
    ) -> Result<String, SwapError> {
        let target_value = match target {
            TargetImage::Url(raw) => {
                Url::parse(raw)
                    .map_err(|e| SwapError::Validation(format!("Invalid target URL: {}", e)))?;
                raw.clone()
            }
            TargetImage::Bytes { bytes, content_type } => data_url(content_type, bytes),
        };
        let swap_value = data_url(&source.content_type, &source.bytes);

        let body = serde_json::json!({
            "model": self.config.model,
            "task_type": "face-swap",
            "input": {
                "target_image": target_value,
                "swap_image": swap_value,
            }
        });

        let url = self.endpoint("/task");
        debug!("Submitting face-swap task ({} byte source)", source.size);

        match ureq::post(&url)
            .set("X-API-KEY", &self.config.api_key)
            .set("Content-Type", "application/json")
            .send_json(body)
        {
            Ok(response) => {
                let parsed: CreateTaskResponse = handle_response(response)?;
                extract_task_id(&parsed)
                    .ok_or_else(|| SwapError::Malformed("No task id in response".to_string()))
            }
            Err(ureq::Error::Status(code, response)) => {
                Err(classify_vendor_error(code, response))
            }
            Err(e) => Err(SwapError::Network(e.to_string())),
        }
    }

    fn fetch_status(&self, task_id: &str) -> Result<TaskStatus, SwapError> {
        let url = self.endpoint(&format!("/task/{}", task_id));

        match ureq::get(&url).set("X-API-KEY", &self.config.api_key).call() {
            Ok(response) => {
                let parsed: StatusResponse = handle_response(response)?;
                Ok(normalize_status(parsed.into_payload()))
            }
            Err(ureq::Error::Status(code, response)) => {
                let err = classify_vendor_error(code, response);
                error!("Status check for task {} failed: {}", task_id, err);
                Err(err)
            }
            Err(e) => Err(SwapError::Network(e.to_string())),
        }
    }
}

fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, BASE64.encode(bytes))
}

fn handle_response<T: serde::de::DeserializeOwned>(
    response: ureq::Response,
) -> Result<T, SwapError> {
    let status = response.status();
    if (200..300).contains(&status) {
        response
            .into_json::<T>()
            .map_err(|e| SwapError::Malformed(format!("Failed to parse response: {}", e)))
    } else {
        let message = response
            .into_string()
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(SwapError::Api { status, message })
    }
}

/// Maps a non-2xx vendor reply to the error taxonomy. JSON bodies yield
/// their message; anything else degrades to "status: status text".
fn classify_vendor_error(code: u16, response: ureq::Response) -> SwapError {
    let status_text = response.status_text().to_string();
    let body = response.into_string().unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .or_else(|| v.get("error").and_then(|m| m.as_str()).map(str::to_string))
                .or_else(|| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
        })
        .unwrap_or_else(|| format!("{}: {}", code, status_text));

    if is_size_error(&message) {
        SwapError::OversizedImage(message)
    } else {
        SwapError::Api { status: code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskState;

    fn source_image() -> ProcessedImage {
        ProcessedImage {
            file_name: "face.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width: 2,
            height: 2,
            size: 4,
            original_width: None,
            original_height: None,
            original_size: None,
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> HttpTaskClient {
        HttpTaskClient::new(ApiConfig::new("test-key").with_base_url(server.url()))
    }

    #[test]
    fn test_submit_enveloped_response() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/task")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body(r#"{"code": 200, "data": {"task_id": "task-1"}, "message": "success"}"#)
            .create();

        let client = client_for(&server);
        let target = TargetImage::Url("https://cdn.example.com/frame.jpg".to_string());
        let task_id = client.submit_task(&target, &source_image()).unwrap();

        assert_eq!(task_id, "task-1");
        mock.assert();
    }

    #[test]
    fn test_submit_flat_response() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/task")
            .with_status(200)
            .with_body(r#"{"id": "task-2"}"#)
            .create();

        let client = client_for(&server);
        let target = TargetImage::Bytes {
            bytes: vec![1, 2, 3],
            content_type: "image/png".to_string(),
        };
        let task_id = client.submit_task(&target, &source_image()).unwrap();

        assert_eq!(task_id, "task-2");
    }

    #[test]
    fn test_submit_without_task_id_is_malformed() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/task")
            .with_status(200)
            .with_body(r#"{"message": "accepted"}"#)
            .create();

        let client = client_for(&server);
        let target = TargetImage::Url("https://cdn.example.com/frame.jpg".to_string());
        let err = client.submit_task(&target, &source_image()).unwrap_err();

        assert!(matches!(err, SwapError::Malformed(_)));
    }

    #[test]
    fn test_submit_size_error_is_tagged() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/task")
            .with_status(400)
            .with_body(r#"{"message": "Image size exceeds limit, maximum is 2048px"}"#)
            .create();

        let client = client_for(&server);
        let target = TargetImage::Url("https://cdn.example.com/frame.jpg".to_string());
        let err = client.submit_task(&target, &source_image()).unwrap_err();

        assert!(matches!(err, SwapError::OversizedImage(_)));
        assert_eq!(err.status_code(), 413);
        let text = err.to_string();
        assert!(text.contains("auto-compression"));
    }

    #[test]
    fn test_submit_non_json_error_body() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/task")
            .with_status(502)
            .with_body("upstream exploded")
            .create();

        let client = client_for(&server);
        let target = TargetImage::Url("https://cdn.example.com/frame.jpg".to_string());
        let err = client.submit_task(&target, &source_image()).unwrap_err();

        match err {
            SwapError::Api { status, message } => {
                assert_eq!(status, 502);
                assert!(message.starts_with("502:"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_submit_rejects_bad_target_url() {
        let server = mockito::Server::new();
        let client = client_for(&server);
        let target = TargetImage::Url("not a url".to_string());
        let err = client.submit_task(&target, &source_image()).unwrap_err();

        assert!(matches!(err, SwapError::Validation(_)));
    }

    #[test]
    fn test_fetch_status_completed() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/task/task-1")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body(
                r#"{"code": 200, "data": {"task_id": "task-1", "status": "completed",
                    "output": {"image_url": "https://cdn.example.com/out.jpg"}}}"#,
            )
            .create();

        let client = client_for(&server);
        let status = client.fetch_status("task-1").unwrap();

        assert_eq!(status.state, TaskState::Completed);
        assert_eq!(
            status.result_url,
            Some("https://cdn.example.com/out.jpg".to_string())
        );
    }

    #[test]
    fn test_fetch_status_vendor_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/task/task-9")
            .with_status(404)
            .with_body(r#"{"message": "task not found"}"#)
            .create();

        let client = client_for(&server);
        let err = client.fetch_status("task-9").unwrap_err();

        match err {
            SwapError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "task not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
