//! Rate-limited cache around a single JSON endpoint.
//!
//! The cache holds at most one payload. A poll either serves that payload
//! (when it is younger than the TTL) or issues exactly one fetch. Transient
//! fetch failures keep the previous payload and do not advance the fetch
//! timestamp, so the following poll retries straight away.

use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::client::PayloadSource;
use super::error::{FetchError, truncate_dump};
use super::ttl::Ttl;

/// A fetched and parsed response.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// Response body exactly as received.
    pub raw: String,
    /// Parsed body.
    pub json: Value,
    /// `api_info.status`, if the response carries one.
    pub status: Option<String>,
}

impl Payload {
    /// Parse a response body.
    ///
    /// Fails only if the body is not JSON. A missing status is recorded as
    /// `None` and left for the consumer to judge.
    pub fn parse(raw: String) -> Result<Self, FetchError> {
        let json: Value = serde_json::from_str(&raw).map_err(|e| FetchError::Json {
            message: e.to_string(),
            body: truncate_dump(&raw),
        })?;
        let status = api_status(&json);

        Ok(Self { raw, json, status })
    }
}

/// Read `api_info.status`.
///
/// Any non-null value counts as a status; non-strings are rendered as JSON.
fn api_status(json: &Value) -> Option<String> {
    match json.pointer("/api_info/status")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The last successful fetch.
///
/// Replaced wholesale on every successful fetch, never partially updated.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    payload: Option<Arc<Payload>>,
    fetched_at: Option<Instant>,
}

impl CacheEntry {
    /// An entry with nothing fetched yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The cached payload, if any.
    pub fn payload(&self) -> Option<&Arc<Payload>> {
        self.payload.as_ref()
    }

    /// When the cached payload was fetched.
    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    /// Whether a poll at `now` must fetch.
    ///
    /// An entry that has never been fetched is always stale.
    pub fn is_stale(&self, now: Instant, ttl: Ttl) -> bool {
        match self.fetched_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= ttl.as_duration(),
        }
    }

    fn replace(&mut self, payload: Arc<Payload>, now: Instant) {
        *self = CacheEntry {
            payload: Some(payload),
            fetched_at: Some(now),
        };
    }
}

/// Outcome of a poll.
#[derive(Debug)]
pub enum Poll {
    /// A fetch was due and succeeded.
    Fetched(Arc<Payload>),

    /// The cached payload is within its TTL. No network activity.
    Cached(Arc<Payload>),

    /// A fetch was due and failed transiently. The previous payload, if
    /// any, is served and the next poll fetches again.
    Degraded {
        previous: Option<Arc<Payload>>,
        error: FetchError,
    },

    /// No URL is configured. Whatever is cached is served.
    Unconfigured(Option<Arc<Payload>>),
}

impl Poll {
    /// The payload served by this poll.
    pub fn payload(&self) -> Option<&Arc<Payload>> {
        match self {
            Poll::Fetched(payload) | Poll::Cached(payload) => Some(payload),
            Poll::Degraded { previous, .. } => previous.as_ref(),
            Poll::Unconfigured(previous) => previous.as_ref(),
        }
    }

    /// Consume the poll, returning its payload.
    pub fn into_payload(self) -> Option<Arc<Payload>> {
        match self {
            Poll::Fetched(payload) | Poll::Cached(payload) => Some(payload),
            Poll::Degraded { previous, .. } => previous,
            Poll::Unconfigured(previous) => previous,
        }
    }

    /// Whether the served payload may be older than the TTL.
    pub fn is_stale(&self) -> bool {
        matches!(self, Poll::Degraded { .. } | Poll::Unconfigured(_))
    }
}

/// Configuration for a polling client.
#[derive(Debug, Clone, Default)]
pub struct PollerConfig {
    /// Endpoint URL. Polling is a no-op without one.
    pub url: Option<String>,
    /// Minimum interval between fetches
    pub ttl: Ttl,
}

impl PollerConfig {
    /// Create a config with no URL and the default TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug)]
struct State {
    url: Option<Url>,
    ttl: Ttl,
    entry: CacheEntry,
}

/// Fetch-or-serve-cache client for one endpoint.
///
/// Cheap to clone; clones share the cache. The check, the fetch and the
/// cache update happen under one lock, so concurrent callers never issue
/// duplicate requests.
#[derive(Debug, Clone)]
pub struct PollingClient<S> {
    source: Arc<S>,
    state: Arc<Mutex<State>>,
}

impl<S: PayloadSource> PollingClient<S> {
    /// Create a new polling client.
    ///
    /// Fails if the configured URL is malformed.
    pub fn new(source: S, config: PollerConfig) -> Result<Self, FetchError> {
        let url = config.url.as_deref().map(parse_url).transpose()?;

        Ok(Self {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(State {
                url,
                ttl: config.ttl,
                entry: CacheEntry::empty(),
            })),
        })
    }

    /// The payload source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The configured URL.
    pub async fn url(&self) -> Option<Url> {
        self.state.lock().await.url.clone()
    }

    /// Point the client at a new URL.
    ///
    /// A malformed URL is rejected and the current one kept. The cache is
    /// left alone; it expires through the TTL as usual.
    pub async fn set_url(&self, url: &str) -> Result<(), FetchError> {
        let url = parse_url(url)?;
        self.state.lock().await.url = Some(url);
        Ok(())
    }

    /// Remove the URL, turning polls into no-ops.
    pub async fn clear_url(&self) {
        self.state.lock().await.url = None;
    }

    /// The current TTL.
    pub async fn ttl(&self) -> Ttl {
        self.state.lock().await.ttl
    }

    /// Change the TTL.
    ///
    /// Values that are not a valid TTL are ignored and the previous TTL is
    /// kept. Returns whether the TTL changed.
    pub async fn set_ttl<T: TryInto<Ttl>>(&self, ttl: T) -> bool {
        let Ok(ttl) = ttl.try_into() else {
            return false;
        };
        self.state.lock().await.ttl = ttl;
        true
    }

    /// Last observed `api_info.status`.
    pub async fn status(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.entry.payload().and_then(|p| p.status.clone())
    }

    /// Snapshot of the cache entry.
    pub async fn entry(&self) -> CacheEntry {
        self.state.lock().await.entry.clone()
    }

    /// Get the current payload, fetching only if the cache is stale.
    ///
    /// Transient failures are reported through [`Poll::Degraded`]. Only a
    /// malformed URL or a body that is not JSON is returned as an error; in
    /// both cases the cache is left untouched.
    pub async fn get_data(&self) -> Result<Poll, FetchError> {
        let mut state = self.state.lock().await;

        let Some(url) = state.url.clone() else {
            return Ok(Poll::Unconfigured(state.entry.payload().cloned()));
        };

        if !state.entry.is_stale(Instant::now(), state.ttl)
            && let Some(payload) = state.entry.payload()
        {
            return Ok(Poll::Cached(Arc::clone(payload)));
        }

        debug!(url = %url, "Fetching payload");
        match self.source.fetch(&url).await {
            Ok(body) => {
                let payload = Arc::new(Payload::parse(body)?);
                if payload.status.is_none() {
                    debug!(url = %url, "Response has no api_info.status");
                }
                state.entry.replace(Arc::clone(&payload), Instant::now());
                Ok(Poll::Fetched(payload))
            }
            Err(error) if error.is_transient() => {
                warn!(url = %url, error = %error, "Fetch failed, serving previous payload");
                Ok(Poll::Degraded {
                    previous: state.entry.payload().cloned(),
                    error,
                })
            }
            Err(error) => Err(error),
        }
    }
}

/// Parse and check an endpoint URL.
fn parse_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    let invalid = |message: String| FetchError::InvalidUrl {
        url: trimmed.to_string(),
        message,
    };

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::advance;

    use super::*;
    use crate::poller::{ErrorKind, MockSource};

    const URL: &str = "http://mock.invalid/air-temperature";

    fn body(status: &str) -> String {
        json!({
            "api_info": { "status": status },
            "metadata": { "stations": [] },
            "items": []
        })
        .to_string()
    }

    fn client(source: MockSource, ttl_secs: f64) -> PollingClient<MockSource> {
        let config = PollerConfig::new()
            .with_url(URL)
            .with_ttl(Ttl::from_secs_f64(ttl_secs).unwrap());
        PollingClient::new(source, config).unwrap()
    }

    #[test]
    fn payload_parse_extracts_status() {
        let payload = Payload::parse(body("healthy")).unwrap();
        assert_eq!(payload.status.as_deref(), Some("healthy"));
        assert_eq!(payload.json["items"], json!([]));
    }

    #[test]
    fn payload_parse_without_status() {
        let payload = Payload::parse(r#"{"api_info": {}}"#.to_string()).unwrap();
        assert_eq!(payload.status, None);

        let payload = Payload::parse(r#"{"api_info": {"status": null}}"#.to_string()).unwrap();
        assert_eq!(payload.status, None);
    }

    #[test]
    fn payload_parse_renders_non_string_status() {
        let payload = Payload::parse(r#"{"api_info": {"status": 1}}"#.to_string()).unwrap();
        assert_eq!(payload.status.as_deref(), Some("1"));

        let payload = Payload::parse(r#"{"api_info": {"status": false}}"#.to_string()).unwrap();
        assert_eq!(payload.status.as_deref(), Some("false"));
    }

    #[test]
    fn payload_parse_rejects_non_json() {
        let err = Payload::parse("<html>oops</html>".to_string()).unwrap_err();
        assert!(matches!(err, FetchError::Json { ref body, .. } if body == "<html>oops</html>"));
    }

    #[test]
    fn parse_url_validation() {
        assert!(parse_url("https://api.data.gov.sg/v1/environment/air-temperature").is_ok());
        assert!(parse_url("  http://localhost:8080/x \n").is_ok());

        let err = parse_url("not a url").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = parse_url("ftp://example.com/file").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn new_rejects_malformed_url() {
        let config = PollerConfig::new().with_url("::nope::");
        let err = PollingClient::new(MockSource::new(), config).unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn empty_entry_is_stale() {
        let entry = CacheEntry::empty();
        assert!(entry.is_stale(Instant::now(), Ttl::new(Duration::from_secs(3600))));
        assert!(entry.payload().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_gates_fetches() {
        let source = MockSource::always(body("healthy"));
        let client = client(source.clone(), 1.0);

        let first = client.get_data().await.unwrap();
        assert!(matches!(first, Poll::Fetched(_)));
        assert_eq!(source.fetch_count(), 1);

        advance(Duration::from_millis(500)).await;
        let second = client.get_data().await.unwrap();
        assert!(matches!(second, Poll::Cached(_)));
        assert_eq!(second.payload().unwrap().raw, first.payload().unwrap().raw);
        assert_eq!(source.fetch_count(), 1);

        advance(Duration::from_millis(600)).await;
        let third = client.get_data().await.unwrap();
        assert!(matches!(third, Poll::Fetched(_)));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_exactly_at_ttl() {
        let source = MockSource::always(body("healthy"));
        let client = client(source.clone(), 2.0);

        client.get_data().await.unwrap();
        advance(Duration::from_secs(2)).await;
        assert!(matches!(client.get_data().await.unwrap(), Poll::Fetched(_)));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_reads_within_ttl_are_identical() {
        let source = MockSource::new();
        source.push_body(body("healthy")).push_body(body("degraded"));
        let client = client(source.clone(), 10.0);

        let first = client.get_data().await.unwrap().into_payload().unwrap();
        for _ in 0..5 {
            advance(Duration::from_secs(1)).await;
            let again = client.get_data().await.unwrap().into_payload().unwrap();
            assert_eq!(again.raw, first.raw);
            assert!(Arc::ptr_eq(&again, &first));
        }
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_serves_previous_and_retries() {
        let source = MockSource::new();
        source
            .push_body(body("healthy"))
            .push_status(502, "Bad Gateway")
            .push_body(body("degraded"));
        let client = client(source.clone(), 1.0);

        let first = client.get_data().await.unwrap();
        let fetched_at = client.entry().await.fetched_at();

        advance(Duration::from_secs(2)).await;
        let degraded = client.get_data().await.unwrap();
        assert!(degraded.is_stale());
        match &degraded {
            Poll::Degraded { previous, error } => {
                assert_eq!(previous.as_ref().unwrap().raw, first.payload().unwrap().raw);
                assert!(matches!(error, FetchError::Api { status: 502, .. }));
            }
            other => panic!("expected degraded poll, got {other:?}"),
        }
        assert_eq!(client.entry().await.fetched_at(), fetched_at);

        // No time passes: the timestamp was not advanced, so this fetches.
        let recovered = client.get_data().await.unwrap();
        assert!(matches!(recovered, Poll::Fetched(_)));
        assert_eq!(client.status().await.as_deref(), Some("degraded"));
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn transient_failure_before_any_success() {
        let source = MockSource::new();
        source.push_status(500, "Internal Server Error");
        let client = client(source, 1.0);

        let poll = client.get_data().await.unwrap();
        assert!(matches!(poll, Poll::Degraded { previous: None, .. }));
        assert!(poll.payload().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn non_json_body_is_an_error_and_keeps_cache() {
        let source = MockSource::new();
        source.push_body(body("healthy")).push_body("not json");
        let client = client(source.clone(), 1.0);

        client.get_data().await.unwrap();
        let before = client.entry().await;

        advance(Duration::from_secs(1)).await;
        let err = client.get_data().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);

        let after = client.entry().await;
        assert_eq!(after.fetched_at(), before.fetched_at());
        assert_eq!(after.payload(), before.payload());
    }

    #[tokio::test]
    async fn missing_url_is_a_no_op() {
        let source = MockSource::always(body("healthy"));
        let client = PollingClient::new(source.clone(), PollerConfig::new()).unwrap();

        let poll = client.get_data().await.unwrap();
        assert!(matches!(poll, Poll::Unconfigured(None)));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn cleared_url_serves_cache() {
        let source = MockSource::always(body("healthy"));
        let client = client(source.clone(), 0.0);

        client.get_data().await.unwrap();
        client.clear_url().await;
        assert!(client.url().await.is_none());

        let poll = client.get_data().await.unwrap();
        assert!(matches!(poll, Poll::Unconfigured(Some(_))));
        assert!(poll.is_stale());
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn set_url_rejects_malformed() {
        let client = client(MockSource::new(), 1.0);

        let err = client.set_url("definitely not a url").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(client.url().await.unwrap().as_str(), URL);

        client.set_url("https://example.com/other").await.unwrap();
        assert_eq!(
            client.url().await.unwrap().as_str(),
            "https://example.com/other"
        );
    }

    #[tokio::test]
    async fn invalid_ttl_assignment_is_ignored() {
        let client = client(MockSource::new(), 1.0);

        assert!(!client.set_ttl("abc").await);
        assert!(!client.set_ttl(-3.0).await);
        assert!(!client.set_ttl(f64::NAN).await);
        assert_eq!(client.ttl().await.as_duration(), Duration::from_secs(1));

        assert!(client.set_ttl("2.5").await);
        assert_eq!(client.ttl().await.as_duration(), Duration::from_millis(2500));

        assert!(client.set_ttl(Duration::from_secs(7)).await);
        assert_eq!(client.ttl().await.as_duration(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_fetches_every_time() {
        let source = MockSource::always(body("healthy"));
        let client = client(source.clone(), 0.0);

        for _ in 0..3 {
            assert!(matches!(client.get_data().await.unwrap(), Poll::Fetched(_)));
        }
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn concurrent_polls_share_one_fetch() {
        let source = MockSource::always(body("healthy"));
        let client = client(source.clone(), 60.0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.get_data().await.map(|p| p.is_stale()) })
            })
            .collect();

        for handle in handles {
            assert!(!handle.await.unwrap().unwrap());
        }
        assert_eq!(source.fetch_count(), 1);
    }
}
