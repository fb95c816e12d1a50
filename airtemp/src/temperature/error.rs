//! Temperature extraction error types.

use crate::poller::{ErrorKind, FetchError};

/// The configured location does not identify exactly one station.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// No station carries the name
    #[error("no station named {name:?}")]
    NotFound { name: String },

    /// Several stations carry the name
    #[error("station name {name:?} is ambiguous: matches ids {ids:?}")]
    Ambiguous { name: String, ids: Vec<String> },
}

/// Errors from reading the air temperature.
#[derive(Debug, thiserror::Error)]
pub enum TemperatureError {
    /// Fetching the payload failed and nothing usable was cached
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No URL is configured and nothing is cached
    #[error("no data: URL is not configured and nothing is cached")]
    NoData,

    /// The payload has no `api_info.status`
    #[error("malformed response: missing api_info.status (dump: {dump})")]
    MissingStatus { dump: String },

    /// The payload lacks the metadata or reading structure
    #[error("malformed response: {message} (dump: {dump})")]
    Malformed { message: String, dump: String },

    /// The location did not resolve to a single station
    #[error(transparent)]
    Location(#[from] LocationError),

    /// The latest snapshot does not hold exactly one reading for the station.
    /// `dump` holds that snapshot's readings.
    #[error(
        "malformed response: expected one reading for station {station_id}, found {count} (dump: {dump})"
    )]
    ReadingCount {
        station_id: String,
        count: usize,
        dump: String,
    },

    /// The reading is not a number
    #[error("reading for station {station_id} is not a number: {value}")]
    InvalidValue { station_id: String, value: String },
}

impl TemperatureError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TemperatureError::Fetch(e) => e.kind(),
            TemperatureError::Location(_) => ErrorKind::Validation,
            TemperatureError::NoData
            | TemperatureError::MissingStatus { .. }
            | TemperatureError::Malformed { .. }
            | TemperatureError::ReadingCount { .. }
            | TemperatureError::InvalidValue { .. } => ErrorKind::Integrity,
        }
    }
}
