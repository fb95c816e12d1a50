//! data.gov.sg air-temperature response DTOs.
//!
//! These map the parts of the real-time weather response the extractor
//! reads. Unknown fields are ignored. Fields the extractor does not strictly
//! need are optional and read leniently: a value of the wrong shape becomes
//! `None` instead of failing the whole response.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an optional field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Top-level response.
#[derive(Debug, Clone, Deserialize)]
pub struct AirTemperatureResponse {
    /// Station list and reading description.
    pub metadata: Metadata,

    /// Reading snapshots, latest first.
    pub items: Vec<Item>,

    /// API health information.
    #[serde(default, deserialize_with = "lenient")]
    pub api_info: Option<ApiInfo>,
}

/// Response metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    /// Stations that may appear in the readings.
    pub stations: Vec<Station>,

    /// Measurement description, e.g. "DBT 1M F".
    #[serde(default, deserialize_with = "lenient")]
    pub reading_type: Option<String>,

    /// Unit of every reading, e.g. "deg C".
    #[serde(default, deserialize_with = "lenient")]
    pub reading_unit: Option<String>,
}

/// A sensor station.
#[derive(Debug, Clone, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One time slice of readings.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    /// When the readings were taken (ISO 8601 with offset).
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,

    /// At most one reading per station.
    pub readings: Vec<Reading>,
}

/// A single station reading.
#[derive(Debug, Clone, Deserialize)]
pub struct Reading {
    pub station_id: String,
    pub value: ReadingValue,
}

/// A reading value.
///
/// The API sends numbers, but numeric strings are accepted as well.
/// Anything else is kept as-is and only rejected if it is the value asked for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Number(f64),
    Text(String),
    Other(Value),
}

impl ReadingValue {
    /// The value as a finite number, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            ReadingValue::Number(n) => *n,
            ReadingValue::Text(s) => s.trim().parse().ok()?,
            ReadingValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingValue::Number(n) => write!(f, "{n}"),
            ReadingValue::Text(s) => write!(f, "{s:?}"),
            ReadingValue::Other(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
}
