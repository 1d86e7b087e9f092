use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Client-side settings for the reader core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL of the reader's REST service.
    pub backend_url: String,
    /// Whether `search` uses the event-stream endpoint by default.
    pub streaming_search: bool,
    pub connect_timeout_secs: u64,
    pub default_translation_language: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            streaming_search: true,
            connect_timeout_secs: 10,
            default_translation_language: None,
        }
    }
}

/// The subset of the server's admin config the client reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub llm_enabled: bool,
}
