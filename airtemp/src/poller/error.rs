//! Poller error types.

/// Maximum number of characters of a response body kept in error messages.
pub(crate) const DUMP_LIMIT: usize = 4096;

/// Truncate a body for inclusion in an error message.
pub(crate) fn truncate_dump(body: &str) -> String {
    body.chars().take(DUMP_LIMIT).collect()
}

/// Broad classification of failures.
///
/// Callers use this to decide whether calling again later can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration, such as a malformed URL. Retrying will not help.
    Configuration,
    /// Network or HTTP-layer failure. The next poll retries immediately.
    Transient,
    /// The response does not have the expected structure.
    Integrity,
    /// The configured location does not resolve to exactly one station.
    Validation,
}

/// Errors from fetching a payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The configured URL cannot be used
    #[error("invalid URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    /// HTTP request failed (connection refused, timeout, truncated body, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Body is not valid JSON
    #[error("JSON parse error: {message} (body: {body})")]
    Json { message: String, body: String },
}

impl FetchError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => ErrorKind::Configuration,
            FetchError::Http(_) | FetchError::Api { .. } => ErrorKind::Transient,
            FetchError::Json { .. } => ErrorKind::Integrity,
        }
    }

    /// Whether the poller degrades to serving cached data for this error.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}
