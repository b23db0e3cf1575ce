use thiserror::Error;

/// Rejections raised by the task and activity stores before any state changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task title cannot be empty")]
    TitleEmpty,
    #[error("durations must be a positive number of minutes")]
    InvalidDuration,
    #[error("not found: {0}")]
    NotFound(String),
}

/// Failures of the local blob store. Typed cache helpers log these and
/// report a cache miss instead of returning them.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cache entry {key} is not valid: {reason}")]
    Decode { key: String, reason: String },
    #[error("cache entry {key} could not be encoded: {reason}")]
    Encode { key: String, reason: String },
}

/// Failures talking to the remote task store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("no remote store is configured")]
    NotConfigured,
    #[error("remote store unreachable: {0}")]
    Unreachable(String),
    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode remote response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Unreachable(e.to_string())
        }
    }
}

/// Failures reading or writing the remote API key in the system keyring.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{0}")]
    Keyring(String),
    #[error("stored secret is not valid UTF-8")]
    InvalidSecret,
}
