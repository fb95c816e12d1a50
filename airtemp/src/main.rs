use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use airtemp::config::Config;
use airtemp::poller::{ErrorKind, HttpSource, PollingClient};
use airtemp::temperature::AirTemperatureClient;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let source = match HttpSource::new(config.http_config()) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let poller = match PollingClient::new(source, config.poller_config()) {
        Ok(poller) => poller,
        Err(e) => {
            error!(error = %e, "Invalid endpoint");
            return ExitCode::FAILURE;
        }
    };

    let client = AirTemperatureClient::new(poller, &config.location);

    info!(
        url = %config.url,
        ttl = %config.ttl,
        location = %config.location,
        interval_ms = config.poll_interval.as_millis() as u64,
        "Polling air temperature"
    );

    let mut completed: u64 = 0;
    while config.iterations.is_none_or(|n| completed < n) {
        tokio::time::sleep(config.poll_interval).await;
        completed += 1;

        match client.get_air_temperature_reading().await {
            Ok(reading) if reading.stale => warn!(
                celsius = reading.celsius,
                station = %reading.station_id,
                "Serving last known temperature"
            ),
            Ok(reading) => info!(
                celsius = reading.celsius,
                station = %reading.station_id,
                "Air temperature"
            ),
            Err(e) if e.kind() == ErrorKind::Configuration => {
                error!(error = %e, "Configuration error, stopping");
                return ExitCode::FAILURE;
            }
            Err(e) => error!(error = %e, "Failed to read air temperature"),
        }
    }

    ExitCode::SUCCESS
}
