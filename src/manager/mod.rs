// Face-swap task lifecycle: submission, polling, cancellation
pub mod scheduler;

pub use scheduler::{PollScheduler, TokioScheduler};

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{HttpTaskClient, TargetImage, TaskApi};
use crate::config::ApiConfig;
use crate::error::{HistoryError, SwapError};
use crate::history::{FileHistoryStore, HistoryStore, IdentityProvider};
use crate::models::{
    GenerationPatch, GenerationRecord, GenerationStatus, ProcessedImage, SwapPhase, SwapTask,
    TaskState,
};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_POLL_ATTEMPTS: u32 = 60;

const NO_RESULT_MESSAGE: &str = "Task completed but no result image was returned";
const FAILED_DEFAULT_MESSAGE: &str = "Task processing failed";

/// Point-in-time view of the lifecycle for the presentation layer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SwapSnapshot {
    pub phase: SwapPhase,
    pub task_id: Option<String>,
    pub attempts: u32,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

struct LifecycleState {
    phase: SwapPhase,
    task: Option<SwapTask>,
}

/// Drives one face swap from submission to a terminal phase. One manager
/// tracks at most one task at a time; overlapping submits are no-ops.
pub struct SwapManager {
    client: Arc<dyn TaskApi>,
    history: Arc<dyn HistoryStore>,
    identity: Arc<dyn IdentityProvider>,
    scheduler: Arc<dyn PollScheduler>,
    state: Mutex<LifecycleState>,
    in_flight: AtomicBool,
    cancelled: AtomicBool,
}

impl SwapManager {
    pub fn new(
        client: Arc<dyn TaskApi>,
        history: Arc<dyn HistoryStore>,
        identity: Arc<dyn IdentityProvider>,
        scheduler: Arc<dyn PollScheduler>,
    ) -> Self {
        Self {
            client,
            history,
            identity,
            scheduler,
            state: Mutex::new(LifecycleState {
                phase: SwapPhase::Idle,
                task: None,
            }),
            in_flight: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Production wiring: HTTP client against the configured vendor, the
    /// on-disk history store, and real timers.
    pub fn with_defaults(
        config: ApiConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, HistoryError> {
        let history = FileHistoryStore::new(identity.clone())?;
        Ok(Self::new(
            Arc::new(HttpTaskClient::new(config)),
            Arc::new(history),
            identity,
            Arc::new(TokioScheduler),
        ))
    }

    pub fn snapshot(&self) -> SwapSnapshot {
        let state = self.state.lock();
        SwapSnapshot {
            phase: state.phase,
            task_id: state.task.as_ref().map(|t| t.task_id.clone()),
            attempts: state.task.as_ref().map(|t| t.attempts).unwrap_or(0),
            result_url: state.task.as_ref().and_then(|t| t.result_url.clone()),
            error: state.task.as_ref().and_then(|t| t.error.clone()),
        }
    }

    pub fn phase(&self) -> SwapPhase {
        self.state.lock().phase
    }

    /// Submits the swap and polls until a terminal phase. Validation
    /// problems are returned as errors before any network traffic;
    /// everything after submission lands in the snapshot instead.
    pub async fn run_swap(
        &self,
        target: TargetImage,
        source: ProcessedImage,
    ) -> Result<SwapSnapshot, SwapError> {
        let user = self.identity.current_user().ok_or_else(|| {
            SwapError::Validation("Please sign in before starting a face swap".to_string())
        })?;
        if source.bytes.is_empty() {
            return Err(SwapError::Validation(
                "Source image is required".to_string(),
            ));
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Swap already in flight, ignoring duplicate submit");
            return Ok(self.snapshot());
        }
        self.cancelled.store(false, Ordering::SeqCst);

        let snapshot = self.drive(&user.uid, user.email.clone(), target, source).await;

        self.in_flight.store(false, Ordering::SeqCst);
        Ok(snapshot)
    }

    /// Cancels any active polling and returns to Idle. A status fetch
    /// already on the wire gets discarded when it lands.
    pub fn reset(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.phase = SwapPhase::Idle;
        state.task = None;
        info!("Swap state reset");
    }

    async fn drive(
        &self,
        user_id: &str,
        user_email: Option<String>,
        target: TargetImage,
        source: ProcessedImage,
    ) -> SwapSnapshot {
        let task_id = match self.client.submit_task(&target, &source) {
            Ok(id) => id,
            Err(e) => {
                error!("Task submission failed: {}", e);
                self.fail(e.to_string());
                return self.snapshot();
            }
        };
        info!("Face-swap task {} submitted", task_id);

        {
            let mut state = self.state.lock();
            state.phase = SwapPhase::Loading;
            state.task = Some(SwapTask::new(task_id.clone()));
        }

        // Optimistic record with the placeholder result. History trouble
        // is logged, never surfaced as a task failure.
        let record = GenerationRecord::new(
            user_id.to_string(),
            user_email,
            target.label(),
            Some(source.file_name.clone()),
            task_id.clone(),
        );
        let history_id = match self.history.create(record) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Could not record generation in history: {}", e);
                None
            }
        };
        if let Some(id) = &history_id {
            if let Some(task) = self.state.lock().task.as_mut() {
                task.history_id = Some(id.clone());
            }
        }

        self.poll_until_terminal(&task_id, history_id.as_deref()).await;
        self.snapshot()
    }

    async fn poll_until_terminal(&self, task_id: &str, history_id: Option<&str>) {
        let mut attempts: u32 = 0;

        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                debug!("Polling cancelled for task {}", task_id);
                return;
            }
            if attempts >= MAX_POLL_ATTEMPTS {
                error!("Task {} did not finish within {} attempts", task_id, attempts);
                self.fail(SwapError::Timeout { attempts }.to_string());
                self.record_outcome(history_id, None);
                return;
            }

            let fetched = self.client.fetch_status(task_id);
            if self.cancelled.load(Ordering::SeqCst) {
                debug!("Discarding stale status for task {}", task_id);
                return;
            }

            let status = match fetched {
                Ok(status) => status,
                Err(e) => {
                    error!("Polling task {} failed: {}", task_id, e);
                    self.fail(e.to_string());
                    self.record_outcome(history_id, None);
                    return;
                }
            };

            match status.state {
                TaskState::Completed => {
                    match status.result_url {
                        Some(url) => {
                            info!("Task {} completed", task_id);
                            self.succeed(url.clone());
                            self.record_outcome(history_id, Some(url));
                        }
                        None => {
                            warn!("Task {} completed without a result image", task_id);
                            self.fail(NO_RESULT_MESSAGE.to_string());
                            self.record_outcome(history_id, None);
                        }
                    }
                    return;
                }
                TaskState::Failed => {
                    let message = status
                        .error
                        .unwrap_or_else(|| FAILED_DEFAULT_MESSAGE.to_string());
                    error!("Task {} failed: {}", task_id, message);
                    self.fail(message);
                    self.record_outcome(history_id, None);
                    return;
                }
                _ => {
                    attempts += 1;
                    debug!(
                        "Task {} still processing, attempt {}/{}",
                        task_id, attempts, MAX_POLL_ATTEMPTS
                    );
                    if let Some(task) = self.state.lock().task.as_mut() {
                        task.attempts = attempts;
                    }
                    self.scheduler.wait(POLL_INTERVAL).await;
                }
            }
        }
    }

    fn succeed(&self, result_url: String) {
        let mut state = self.state.lock();
        state.phase = SwapPhase::Succeeded;
        if let Some(task) = state.task.as_mut() {
            task.result_url = Some(result_url);
        }
    }

    fn fail(&self, message: String) {
        let mut state = self.state.lock();
        state.phase = SwapPhase::Failed;
        if let Some(task) = state.task.as_mut() {
            task.error = Some(message);
        } else {
            state.task = Some(SwapTask {
                task_id: String::new(),
                attempts: 0,
                result_url: None,
                error: Some(message),
                history_id: None,
                created_at: chrono::Utc::now().to_rfc3339(),
            });
        }
    }

    /// Best-effort terminal update of the optimistic history record.
    fn record_outcome(&self, history_id: Option<&str>, result_url: Option<String>) {
        let Some(id) = history_id else { return };
        let patch = match result_url {
            Some(url) => GenerationPatch {
                result_image: Some(url),
                status: Some(GenerationStatus::Completed),
            },
            None => GenerationPatch {
                result_image: None,
                status: Some(GenerationStatus::Failed),
            },
        };
        if let Err(e) = self.history.update(id, patch) {
            warn!("Could not update history record {}: {}", id, e);
        }
    }
}
