//! Driver configuration, read from environment variables.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::poller::{HttpSourceConfig, PollerConfig, Ttl};
use crate::temperature::DEFAULT_LOCATION;

/// Public data.gov.sg real-time air-temperature endpoint.
pub const DEFAULT_URL: &str = "https://api.data.gov.sg/v1/environment/air-temperature";

/// URL file read when neither `AIRTEMP_URL` nor `AIRTEMP_URL_FILE` is set.
pub const DEFAULT_URL_FILE: &str = "api_urls/air_temperature.txt";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be used
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    /// The URL file could not be read
    #[error("failed to read URL file {path}: {source}")]
    UrlFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for the polling driver.
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint URL
    pub url: String,
    /// Minimum interval between fetches
    pub ttl: Ttl,
    /// Station name to report
    pub location: String,
    /// Delay before each poll
    pub poll_interval: Duration,
    /// Number of polls to run; `None` runs forever.
    pub iterations: Option<u64>,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            ttl: Ttl::new(Duration::from_secs(1)),
            location: DEFAULT_LOCATION.to_string(),
            poll_interval: Duration::from_millis(200),
            iterations: Some(10_000),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// | Variable                   | Default                          |
    /// |----------------------------|----------------------------------|
    /// | `AIRTEMP_URL`              | contents of the URL file         |
    /// | `AIRTEMP_URL_FILE`         | `api_urls/air_temperature.txt`   |
    /// | `AIRTEMP_TTL_SECS`         | `1`                              |
    /// | `AIRTEMP_LOCATION`         | `Sentosa`                        |
    /// | `AIRTEMP_POLL_INTERVAL_MS` | `200`                            |
    /// | `AIRTEMP_ITERATIONS`       | `10000` (`0` runs forever)       |
    /// | `AIRTEMP_TIMEOUT_SECS`     | `30`                             |
    ///
    /// If no URL variable is set and the default URL file does not exist,
    /// the public data.gov.sg endpoint is used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let url = match (lookup("AIRTEMP_URL"), lookup("AIRTEMP_URL_FILE")) {
            (Some(url), _) => url.trim().to_string(),
            (None, Some(path)) => read_url_file(Path::new(&path))?,
            (None, None) => {
                let path = Path::new(DEFAULT_URL_FILE);
                if path.is_file() {
                    read_url_file(path)?
                } else {
                    defaults.url
                }
            }
        };

        let ttl = parse_var(&lookup, "AIRTEMP_TTL_SECS", defaults.ttl)?;
        let location = lookup("AIRTEMP_LOCATION").unwrap_or(defaults.location);
        let poll_interval_ms: u64 = parse_var(
            &lookup,
            "AIRTEMP_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )?;
        let iterations: u64 = parse_var(
            &lookup,
            "AIRTEMP_ITERATIONS",
            defaults.iterations.unwrap_or(0),
        )?;
        let timeout_secs = parse_var(&lookup, "AIRTEMP_TIMEOUT_SECS", defaults.timeout_secs)?;

        Ok(Self {
            url,
            ttl,
            location,
            poll_interval: Duration::from_millis(poll_interval_ms),
            iterations: (iterations > 0).then_some(iterations),
            timeout_secs,
        })
    }

    /// Poller settings derived from this config.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::new().with_url(&self.url).with_ttl(self.ttl)
    }

    /// HTTP settings derived from this config.
    pub fn http_config(&self) -> HttpSourceConfig {
        HttpSourceConfig::new().with_timeout(self.timeout_secs)
    }
}

/// Read an endpoint URL from a text file, ignoring surrounding whitespace.
pub fn read_url_file(path: &Path) -> Result<String, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::UrlFile {
        path: path.to_path_buf(),
        source,
    })?;

    let url = contents.trim();
    if url.is_empty() {
        return Err(ConfigError::Invalid {
            key: "AIRTEMP_URL_FILE",
            message: format!("{} is empty", path.display()),
        });
    }

    Ok(url.to_string())
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("{raw:?}: {e}"),
        }),
    }
}
