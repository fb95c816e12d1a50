//! Time-to-live for cached payloads.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default TTL: the endpoint is polled at most twice a second.
pub const DEFAULT_TTL: Duration = Duration::from_millis(500);

/// Error returned when a value cannot be used as a TTL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid TTL {input:?}: {reason}")]
pub struct InvalidTtl {
    input: String,
    reason: &'static str,
}

/// Minimum interval between two network fetches.
///
/// Any non-negative, finite number of seconds is valid. A zero TTL makes
/// every poll stale.
///
/// # Examples
///
/// ```
/// use airtemp::poller::Ttl;
///
/// let ttl: Ttl = "1.5".parse().unwrap();
/// assert_eq!(ttl.as_duration().as_millis(), 1500);
///
/// assert!("fast".parse::<Ttl>().is_err());
/// assert!(Ttl::from_secs_f64(-1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(Duration);

impl Ttl {
    /// Create a TTL from a duration.
    pub const fn new(duration: Duration) -> Self {
        Ttl(duration)
    }

    /// Create a TTL from a number of seconds.
    pub fn from_secs_f64(secs: f64) -> Result<Self, InvalidTtl> {
        let invalid = |reason| InvalidTtl {
            input: secs.to_string(),
            reason,
        };

        if secs.is_nan() {
            return Err(invalid("not a number"));
        }
        if secs.is_infinite() {
            return Err(invalid("must be finite"));
        }
        if secs < 0.0 {
            return Err(invalid("must not be negative"));
        }

        Duration::try_from_secs_f64(secs)
            .map(Ttl)
            .map_err(|_| invalid("out of range"))
    }

    /// Returns the TTL as a duration.
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl(DEFAULT_TTL)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl(duration)
    }
}

impl TryFrom<f64> for Ttl {
    type Error = InvalidTtl;

    fn try_from(secs: f64) -> Result<Self, Self::Error> {
        Ttl::from_secs_f64(secs)
    }
}

impl FromStr for Ttl {
    type Err = InvalidTtl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs: f64 = s.trim().parse().map_err(|_| InvalidTtl {
            input: s.to_string(),
            reason: "not a number of seconds",
        })?;
        Ttl::from_secs_f64(secs).map_err(|e| InvalidTtl {
            input: s.to_string(),
            reason: e.reason,
        })
    }
}

impl TryFrom<&str> for Ttl {
    type Error = InvalidTtl;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0.as_secs_f64())
    }
}
