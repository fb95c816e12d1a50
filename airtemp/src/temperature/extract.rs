//! Pure extraction of a station's air temperature from a cached payload.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::poller::{Payload, truncate_dump};

use super::error::{LocationError, TemperatureError};
use super::types::{AirTemperatureResponse, Reading, Station};

/// Status the API reports when all is well.
pub const HEALTHY_STATUS: &str = "healthy";

/// An air-temperature reading for one station.
#[derive(Debug, Clone, PartialEq)]
pub struct AirTemperature {
    /// Temperature in `unit` (degrees Celsius for this API).
    pub celsius: f64,
    pub station_id: String,
    pub location: String,
    /// Unit reported by the API, e.g. "deg C".
    pub unit: Option<String>,
    /// When the snapshot was taken, if the API says.
    pub observed_at: Option<DateTime<FixedOffset>>,
    /// `api_info.status` of the payload the reading came from.
    pub api_status: String,
    /// Set when the payload was served without a successful fetch, after a
    /// transient failure or with no URL configured.
    pub stale: bool,
}

/// Resolve a location name to its station id.
///
/// Exactly one station must carry `name`.
pub fn resolve_station_id<'a>(stations: &'a [Station], name: &str) -> Result<&'a str, LocationError> {
    let ids: Vec<&str> = stations
        .iter()
        .filter(|s| s.name == name)
        .map(|s| s.id.as_str())
        .collect();

    match ids.as_slice() {
        [id] => Ok(*id),
        [] => Err(LocationError::NotFound {
            name: name.to_string(),
        }),
        _ => Err(LocationError::Ambiguous {
            name: name.to_string(),
            ids: ids.iter().map(|id| id.to_string()).collect(),
        }),
    }
}

/// All readings for `station_id` in a snapshot.
pub fn matching_readings<'a>(readings: &'a [Reading], station_id: &str) -> Vec<&'a Reading> {
    readings
        .iter()
        .filter(|r| r.station_id == station_id)
        .collect()
}

/// Extract the air temperature at `location` from a payload.
///
/// Checks that a status is present, resolves the location to a station,
/// then reads that station's value from the latest snapshot. The returned
/// reading is never marked stale; that is the caller's call.
pub fn extract_air_temperature(
    payload: &Payload,
    location: &str,
) -> Result<AirTemperature, TemperatureError> {
    let Some(status) = payload.status.as_deref() else {
        return Err(TemperatureError::MissingStatus {
            dump: truncate_dump(&payload.json.to_string()),
        });
    };

    let malformed = |message: String| TemperatureError::Malformed {
        message,
        dump: truncate_dump(&payload.raw),
    };

    let response =
        AirTemperatureResponse::deserialize(&payload.json).map_err(|e| malformed(e.to_string()))?;

    let station_id = resolve_station_id(&response.metadata.stations, location)?;

    let snapshot = response
        .items
        .first()
        .ok_or_else(|| malformed("no reading snapshots".to_string()))?;

    let matches = matching_readings(&snapshot.readings, station_id);
    let [reading] = matches.as_slice() else {
        let readings = payload
            .json
            .pointer("/items/0/readings")
            .map_or_else(|| payload.raw.clone(), |r| r.to_string());
        return Err(TemperatureError::ReadingCount {
            station_id: station_id.to_string(),
            count: matches.len(),
            dump: truncate_dump(&readings),
        });
    };

    let celsius = reading
        .value
        .as_f64()
        .ok_or_else(|| TemperatureError::InvalidValue {
            station_id: station_id.to_string(),
            value: reading.value.to_string(),
        })?;

    let observed_at = snapshot
        .timestamp
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok());

    Ok(AirTemperature {
        celsius,
        station_id: station_id.to_string(),
        location: location.to_string(),
        unit: response.metadata.reading_unit.clone(),
        observed_at,
        api_status: status.to_string(),
        stale: false,
    })
}
