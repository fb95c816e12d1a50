//! Air-temperature poller for the data.gov.sg real-time weather API.
//!
//! Polls a JSON endpoint no more often than a configurable TTL, keeps the
//! last response, and reads the temperature reported by one named station.
//! Transient network failures degrade to serving the last good response.

pub mod config;
pub mod poller;
pub mod temperature;
