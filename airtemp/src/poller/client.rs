//! HTTP payload source.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;

use super::error::{FetchError, truncate_dump};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Something that can produce the body behind a URL.
///
/// The poller only ever calls `fetch` while holding its cache lock, so an
/// implementation sees at most one request at a time per poller.
pub trait PayloadSource: Send + Sync {
    /// Fetch the body at `url`.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Configuration for the HTTP source.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl HttpSourceConfig {
    /// Create a config with the default timeout.
    pub fn new() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain HTTP GET source backed by `reqwest`.
///
/// A connection is only held for the duration of one fetch.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
}

impl HttpSource {
    /// Create a new HTTP source.
    pub fn new(config: HttpSourceConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self { http })
    }
}

impl PayloadSource for HttpSource {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: truncate_dump(&body),
            });
        }

        Ok(response.text().await?)
    }
}

/// Builder errors mean reqwest could not use the URL at all.
fn classify(url: &Url, err: reqwest::Error) -> FetchError {
    if err.is_builder() {
        FetchError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        FetchError::Http(err)
    }
}
