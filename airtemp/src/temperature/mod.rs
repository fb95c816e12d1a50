//! Air-temperature extraction.
//!
//! The data.gov.sg air-temperature endpoint returns a station list under
//! `metadata.stations` and time-ordered reading snapshots under `items`.
//! A location name is resolved to a station id through the station list,
//! then looked up in the latest snapshot.
//!
//! Extraction is a set of pure functions over a cached [`Payload`]; the
//! [`AirTemperatureClient`] only adds the polling.
//!
//! [`Payload`]: crate::poller::Payload

mod client;
mod error;
mod extract;
mod types;

pub use client::{AirTemperatureClient, DEFAULT_LOCATION};
pub use error::{LocationError, TemperatureError};
pub use extract::{
    AirTemperature, HEALTHY_STATUS, extract_air_temperature, matching_readings,
    resolve_station_id,
};
pub use types::{
    AirTemperatureResponse, ApiInfo, GeoPoint, Item, Metadata, Reading, ReadingValue, Station,
};
