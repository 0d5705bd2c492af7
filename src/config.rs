//! Static station configuration
//!
//! Configuration is fixed for the lifetime of the process. On the device it is
//! compiled in from `STATION_*` environment variables (see `build.rs`, which
//! also reads a local `.env`); the simulator may load the same structure from
//! a TOML file.

use alloc::string::{String, ToString};

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::sensors::SensorToggles;
use crate::telemetry::is_valid_device_name;

/// Default interval between telemetry cycles.
pub const DEFAULT_SAMPLE_PERIOD_MS: u32 = 2000;

/// Default bound on a single transport operation.
pub const DEFAULT_IO_TIMEOUT_MS: u32 = 5000;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TELEMETRY_PATH: &str = "/api/measurements/create";
pub const DEFAULT_COMMAND_PATH: &str = "/ws";
pub const DEFAULT_DEVICE_NAME: &str = "station";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

/// Address of a remote collaborator (HTTP server or command broker).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EndpointAddress {
    /// IP address or hostname
    pub host: String,
    pub port: u16,
    /// Base path, e.g. `/api/measurements/create`
    pub path: String,
}

impl EndpointAddress {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StationConfig {
    pub wifi: WifiCredentials,
    /// Identity reported with every telemetry request
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// HTTP endpoint for telemetry; `None` disables the telemetry role
    #[serde(default)]
    pub telemetry: Option<EndpointAddress>,
    /// Message broker for actuator commands; `None` disables the command role
    #[serde(default)]
    pub commands: Option<EndpointAddress>,
    #[serde(default = "default_sample_period_ms")]
    pub sample_period_ms: u32,
    #[serde(default)]
    pub sensors: SensorToggles,
    /// The actuator is lit when its pin is driven low
    #[serde(default = "default_active_low")]
    pub actuator_active_low: bool,
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u32,
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}

const fn default_sample_period_ms() -> u32 {
    DEFAULT_SAMPLE_PERIOD_MS
}

const fn default_active_low() -> bool {
    true
}

const fn default_io_timeout_ms() -> u32 {
    DEFAULT_IO_TIMEOUT_MS
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("WiFi SSID is empty")]
    EmptySsid,
    #[error("device name must be at least 2 URL-safe characters")]
    InvalidDeviceName,
    #[error("{role} endpoint has an empty host")]
    EmptyHost { role: &'static str },
    #[error("{role} endpoint port must be non-zero")]
    InvalidPort { role: &'static str },
    #[error("{role} endpoint path must start with '/' and contain no query")]
    InvalidPath { role: &'static str },
    #[error("sample period must be non-zero")]
    ZeroSamplePeriod,
    #[error("I/O timeout must be non-zero")]
    ZeroIoTimeout,
    #[error("neither telemetry nor commands are configured")]
    NoRole,
}

impl StationConfig {
    /// Build the configuration baked in at compile time.
    ///
    /// Missing variables fall back to defaults; a role is only enabled when
    /// its host variable is set. Unparseable numbers become `0` so that
    /// [`StationConfig::validate`] rejects them instead of silently using a
    /// default.
    pub fn from_build_env() -> Self {
        let telemetry = option_env!("STATION_TELEMETRY_HOST").map(|host| {
            EndpointAddress::new(
                host,
                parse_port(option_env!("STATION_TELEMETRY_PORT")),
                option_env!("STATION_TELEMETRY_PATH").unwrap_or(DEFAULT_TELEMETRY_PATH),
            )
        });

        let commands = option_env!("STATION_COMMAND_HOST").map(|host| {
            EndpointAddress::new(
                host,
                parse_port(option_env!("STATION_COMMAND_PORT")),
                option_env!("STATION_COMMAND_PATH").unwrap_or(DEFAULT_COMMAND_PATH),
            )
        });

        Self {
            wifi: WifiCredentials {
                ssid: option_env!("STATION_WIFI_SSID").unwrap_or("").to_string(),
                password: option_env!("STATION_WIFI_PASSWORD").unwrap_or("").to_string(),
            },
            device_name: option_env!("STATION_DEVICE_NAME")
                .unwrap_or(DEFAULT_DEVICE_NAME)
                .to_string(),
            telemetry,
            commands,
            sample_period_ms: parse_millis(
                option_env!("STATION_SAMPLE_PERIOD_MS"),
                DEFAULT_SAMPLE_PERIOD_MS,
            ),
            sensors: SensorToggles::default(),
            actuator_active_low: default_active_low(),
            io_timeout_ms: parse_millis(option_env!("STATION_IO_TIMEOUT_MS"), DEFAULT_IO_TIMEOUT_MS),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wifi.ssid.is_empty() {
            return Err(ConfigError::EmptySsid);
        }

        if !is_valid_device_name(&self.device_name) {
            return Err(ConfigError::InvalidDeviceName);
        }

        if self.telemetry.is_none() && self.commands.is_none() {
            return Err(ConfigError::NoRole);
        }

        if let Some(endpoint) = &self.telemetry {
            validate_endpoint(endpoint, "telemetry")?;
        }
        if let Some(endpoint) = &self.commands {
            validate_endpoint(endpoint, "command")?;
        }

        if self.sample_period_ms == 0 {
            return Err(ConfigError::ZeroSamplePeriod);
        }
        if self.io_timeout_ms == 0 {
            return Err(ConfigError::ZeroIoTimeout);
        }

        Ok(())
    }
}

fn parse_port(value: Option<&str>) -> u16 {
    value.map_or(DEFAULT_PORT, |v| v.trim().parse().unwrap_or(0))
}

fn parse_millis(value: Option<&str>, default: u32) -> u32 {
    value.map_or(default, |v| v.trim().parse().unwrap_or(0))
}

fn validate_endpoint(endpoint: &EndpointAddress, role: &'static str) -> Result<(), ConfigError> {
    if endpoint.host.trim().is_empty() {
        return Err(ConfigError::EmptyHost { role });
    }
    if endpoint.port == 0 {
        return Err(ConfigError::InvalidPort { role });
    }

    let path_ok = endpoint.path.starts_with('/')
        && !endpoint
            .path
            .chars()
            .any(|c| c == '?' || c == '#' || c.is_whitespace());
    if !path_ok {
        return Err(ConfigError::InvalidPath { role });
    }

    Ok(())
}
