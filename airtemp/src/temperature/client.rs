//! Air-temperature client: a polling client plus a location.

use tracing::warn;

use crate::poller::{PayloadSource, Poll, PollingClient};

use super::error::TemperatureError;
use super::extract::{AirTemperature, HEALTHY_STATUS, extract_air_temperature};

/// Location used when none is configured.
pub const DEFAULT_LOCATION: &str = "Sentosa";

/// Reads the air temperature at one location.
#[derive(Debug, Clone)]
pub struct AirTemperatureClient<S> {
    poller: PollingClient<S>,
    location: String,
}

impl<S: PayloadSource> AirTemperatureClient<S> {
    /// Create a client for `location`.
    pub fn new(poller: PollingClient<S>, location: impl Into<String>) -> Self {
        Self {
            poller,
            location: location.into(),
        }
    }

    /// Create a client for [`DEFAULT_LOCATION`].
    pub fn with_default_location(poller: PollingClient<S>) -> Self {
        Self::new(poller, DEFAULT_LOCATION)
    }

    /// The underlying polling client.
    pub fn poller(&self) -> &PollingClient<S> {
        &self.poller
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    /// Current air temperature at the configured location.
    pub async fn get_air_temperature(&self) -> Result<f64, TemperatureError> {
        Ok(self.get_air_temperature_reading().await?.celsius)
    }

    /// Current air-temperature reading, with station details and a flag
    /// telling whether it came from a payload that could not be refreshed.
    ///
    /// May fetch, subject to the poller's TTL. A transient failure with
    /// nothing cached is returned as [`TemperatureError::Fetch`].
    pub async fn get_air_temperature_reading(&self) -> Result<AirTemperature, TemperatureError> {
        let poll = self.poller.get_data().await?;
        let stale = poll.is_stale();

        let payload = match poll {
            Poll::Fetched(payload) | Poll::Cached(payload) => payload,
            Poll::Degraded {
                previous: Some(payload),
                ..
            }
            | Poll::Unconfigured(Some(payload)) => payload,
            Poll::Degraded {
                previous: None,
                error,
            } => return Err(error.into()),
            Poll::Unconfigured(None) => return Err(TemperatureError::NoData),
        };

        if let Some(status) = payload.status.as_deref()
            && status != HEALTHY_STATUS
        {
            let url = self.poller.url().await;
            warn!(
                status,
                url = url.as_ref().map_or("<none>", |u| u.as_str()),
                "API is not healthy"
            );
        }

        let mut reading = extract_air_temperature(&payload, &self.location)?;
        reading.stale = stale;
        Ok(reading)
    }
}
