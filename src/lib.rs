//! FaceForge - face-swap generation engine.
//!
//! Wraps a vendor face-swap API behind a polled task lifecycle, with an
//! image pipeline for upload preparation and a local generation history.

pub mod boundary;
pub mod client;
pub mod config;
pub mod error;
mod file_manager;
pub mod history;
pub mod logging;
pub mod manager;
pub mod models;
pub mod pipeline;
mod utils;

pub use client::{HttpTaskClient, TargetImage, TaskApi, TaskStatus};
pub use config::ApiConfig;
pub use error::{HistoryError, SwapError};
pub use history::{FileHistoryStore, HistoryStore, IdentityProvider, StaticIdentity};
pub use manager::{PollScheduler, SwapManager, SwapSnapshot, TokioScheduler};
pub use models::{
    AuthUser, GenerationPatch, GenerationRecord, GenerationStatus, ProcessedImage, SwapPhase,
    TaskState, UploadedImage,
};

use utils::get_history_json_path;

/// Creates the app data tree and seeds the history file. Call once at
/// startup, after `logging::init_logging`.
pub fn initialize_app_data() -> Result<(), String> {
    utils::initialize_data_directories()?;
    file_manager::initialize_json_file(
        &get_history_json_path(),
        &Vec::<models::GenerationRecord>::new(),
    )?;
    logging::cleanup_old_logs();
    log::info!("App data initialized");
    Ok(())
}
