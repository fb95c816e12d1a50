//! Mock payload source for testing without network access.
//!
//! Serves queued bodies or failures in order, then falls back to a fixed
//! response. Counts every fetch so tests can assert on network activity.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::Url;

use super::client::PayloadSource;
use super::error::FetchError;

#[derive(Debug, Clone)]
enum MockResponse {
    Body(String),
    Status { status: u16, message: String },
}

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<MockResponse>,
    fallback: Option<MockResponse>,
    fetches: usize,
    last_url: Option<Url>,
}

/// In-memory payload source.
///
/// Clones share the same queue and counters.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    state: Arc<Mutex<MockState>>,
}

impl MockSource {
    /// Create a mock with nothing queued. Fetches fail with a 503 until
    /// something is queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers every fetch with `body`.
    pub fn always(body: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.lock().fallback = Some(MockResponse::Body(body.into()));
        mock
    }

    /// Queue a successful response body.
    pub fn push_body(&self, body: impl Into<String>) -> &Self {
        self.lock().queue.push_back(MockResponse::Body(body.into()));
        self
    }

    /// Queue a JSON value as a successful response body.
    pub fn push_json(&self, value: &serde_json::Value) -> &Self {
        self.push_body(value.to_string())
    }

    /// Queue a non-success HTTP status.
    pub fn push_status(&self, status: u16, message: impl Into<String>) -> &Self {
        self.lock().queue.push_back(MockResponse::Status {
            status,
            message: message.into(),
        });
        self
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    /// URL of the most recent fetch.
    pub fn last_url(&self) -> Option<Url> {
        self.lock().last_url.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_response(&self, url: &Url) -> Result<String, FetchError> {
        let mut state = self.lock();
        state.fetches += 1;
        state.last_url = Some(url.clone());

        let response = match state.queue.pop_front() {
            Some(response) => Some(response),
            None => state.fallback.clone(),
        };

        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status { status, message }) => {
                Err(FetchError::Api { status, message })
            }
            None => Err(FetchError::Api {
                status: 503,
                message: "no mock response queued".to_string(),
            }),
        }
    }
}

impl PayloadSource for MockSource {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.next_response(url)
    }
}
