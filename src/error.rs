// Error taxonomy for the swap engine
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwapError {
    /// Local input problem caught before any network traffic.
    #[error("{0}")]
    Validation(String),

    /// Vendor rejected the upload for size reasons. The message already
    /// carries the user-facing compression guidance.
    #[error("Image size issue: {0}. Please use a smaller image or try our auto-compression.")]
    OversizedImage(String),

    /// Business error from the vendor, with its HTTP status preserved.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport-level failure before any vendor response.
    #[error("request failed: {0}")]
    Network(String),

    /// Response arrived but could not be interpreted.
    #[error("{0}")]
    Malformed(String),

    #[error("Operation timed out after 5 minutes")]
    Timeout { attempts: u32 },

    /// Decode, encode, or fetch failure inside the image pipeline.
    #[error("{0}")]
    Image(String),

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl SwapError {
    /// HTTP status a boundary surface should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            SwapError::Validation(_) => 400,
            SwapError::OversizedImage(_) => 413,
            SwapError::Api { status, .. } => *status,
            _ => 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("history storage error: {0}")]
    Storage(String),
}
