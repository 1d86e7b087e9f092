use thiserror::Error;

// === BackendError ===

/// Errors raised by a request to the reader's REST service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request could not be sent or the connection broke.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),
    /// The configured backend address is not a usable base URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

// === StreamError ===

/// Terminal failure of a server-sent result stream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("Stream failed: {0}")]
    Transport(String),
    /// The server sent a line longer than the decoder accepts.
    #[error("Stream line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

// === TabError ===

/// Errors from tab lookups that need a result, such as loading content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TabError {
    /// Tab with the given ID is not open.
    #[error("Tab not found: {0}")]
    NotFound(String),
    /// The article body could not be fetched.
    #[error("Failed to load article: {0}")]
    Backend(#[from] BackendError),
}

// === TranslationError ===

/// Errors from translating an open tab.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslationError {
    /// No target language was chosen.
    #[error("No target language selected")]
    MissingLanguage,
    /// The translator reported a failure, e.g. an unknown language pair.
    #[error("Translation failed: {0}")]
    Rejected(String),
    /// The request itself failed.
    #[error("Translation request failed: {0}")]
    Backend(#[from] BackendError),
}

// === SettingsError ===

/// Errors related to loading and updating client settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    IoError(String),
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
