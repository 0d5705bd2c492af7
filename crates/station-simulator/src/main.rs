//! Desktop simulator for station-node.
//!
//! Runs the same `Station` loop as the device against host transports: real
//! HTTP GET telemetry, a websocket command channel, synthetic sensors and a
//! logging LED. The WiFi join is simulated.
//!
//! # Configuration
//!
//! | Variable         | Meaning                                            |
//! |------------------|----------------------------------------------------|
//! | `STATION_CONFIG` | Path to a TOML `StationConfig`                     |
//! | `RUST_LOG`       | `env_logger` filter, e.g. `info` or `debug`        |
//!
//! Without `STATION_CONFIG` the compiled-in `STATION_*` values are used and
//! any missing role points at `127.0.0.1:8080`.

mod host;

use std::time::Duration;
use std::{env, fs, process};

use anyhow::Context;
use log::{error, info};

use station_node::actuator::ActuatorOutput;
use station_node::config::{
    DEFAULT_COMMAND_PATH, DEFAULT_PORT, DEFAULT_TELEMETRY_PATH, EndpointAddress, StationConfig,
};
use station_node::network::NetworkSession;
use station_node::scheduler::Station;
use station_node::sensors::{SensorKind, SensorSuite};

use host::{
    HostClock, HostDelay, HttpGetClient, LoggedLed, SimulatedLink, SyntheticSensor,
    WsCommandChannel,
};

/// Status checks before the simulated radio reports a connection.
const SIMULATED_JOIN_CHECKS: u32 = 3;

/// Every n-th synthetic read fails.
const SYNTHETIC_FAULT_EVERY: u32 = 17;

const FALLBACK_HOST: &str = "127.0.0.1";

fn load_config() -> anyhow::Result<StationConfig> {
    let Ok(path) = env::var("STATION_CONFIG") else {
        return Ok(with_local_fallback(StationConfig::from_build_env()));
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file {path}"))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse configuration file {path}"))
}

fn with_local_fallback(mut config: StationConfig) -> StationConfig {
    if config.wifi.ssid.is_empty() {
        config.wifi.ssid = "simulated".into();
    }
    if config.telemetry.is_none() && config.commands.is_none() {
        config.telemetry = Some(EndpointAddress::new(
            FALLBACK_HOST,
            DEFAULT_PORT,
            DEFAULT_TELEMETRY_PATH,
        ));
        config.commands = Some(EndpointAddress::new(
            FALLBACK_HOST,
            DEFAULT_PORT,
            DEFAULT_COMMAND_PATH,
        ));
    }
    config
}

fn main() {
    env_logger::init();
    info!("Starting station-node simulator");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    let http = match HttpGetClient::new() {
        Ok(http) => http,
        Err(e) => {
            error!("HTTP: failed to build client: {}", e);
            process::exit(1);
        }
    };

    let mut sensors = SensorSuite::new(config.sensors);
    sensors
        .install(SyntheticSensor::new(SensorKind::Temperature, SYNTHETIC_FAULT_EVERY))
        .install(SyntheticSensor::new(SensorKind::Humidity, SYNTHETIC_FAULT_EVERY))
        .install(SyntheticSensor::new(SensorKind::Lightness, SYNTHETIC_FAULT_EVERY))
        .install(SyntheticSensor::new(SensorKind::Digital, 0));

    let session = NetworkSession::new(
        SimulatedLink::new(SIMULATED_JOIN_CHECKS),
        WsCommandChannel::new(Duration::from_millis(config.io_timeout_ms.into())),
        HostDelay,
    );
    let output = ActuatorOutput::new(LoggedLed, config.actuator_active_low);

    Station::new(config, session, sensors, http, output, HostClock::new()).run()
}
