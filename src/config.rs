// Vendor API configuration

pub const DEFAULT_API_BASE: &str = "https://api.piapi.ai/api/v1";
pub const FACE_SWAP_MODEL: &str = "Qubico/image-toolkit";
pub const API_KEY_ENV: &str = "PIAPI_API_KEY";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            model: FACE_SWAP_MODEL.to_string(),
        }
    }

    /// Reads the API key from the environment. A missing or empty key is a
    /// hard error; the engine refuses to run without one.
    pub fn from_env() -> Result<Self, String> {
        let key = std::env::var(API_KEY_ENV)
            .map_err(|_| format!("{} is not set", API_KEY_ENV))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("{} is empty", API_KEY_ENV));
        }
        Ok(Self::new(key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        self.base_url = base.trim_end_matches('/').to_string();
        self
    }
}
