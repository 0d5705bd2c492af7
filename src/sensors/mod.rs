//! Sensor abstraction
//!
//! Every transducer is exposed through the [`Sensor`] trait and wrapped in a
//! [`SensorReading`] slot, which turns faults and disabled sensors into an
//! absent value instead of an error. A [`SensorSuite`] is the fixed, ordered
//! set of slots sampled on every telemetry cycle.

#[cfg(feature = "sensor-bh1750")]
mod bh1750;
mod digital;
#[cfg(feature = "sensor-sht40")]
mod sht40;

#[cfg(feature = "sensor-bh1750")]
pub use bh1750::{Bh1750Address, Bh1750Sensor};
pub use digital::DigitalSensor;
#[cfg(feature = "sensor-sht40")]
pub use sht40::{Sht40Channel, Sht40Sensor};

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// The physical quantity a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Humidity,
    Lightness,
    Digital,
}

impl SensorKind {
    /// Order in which readings appear in a telemetry request.
    pub const TELEMETRY_ORDER: [SensorKind; 3] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Lightness,
    ];

    /// Query parameter name used by the telemetry endpoint, if any.
    pub const fn param_name(self) -> Option<&'static str> {
        match self {
            Self::Temperature => Some("temperature"),
            Self::Humidity => Some("humidity"),
            Self::Lightness => Some("lightness"),
            Self::Digital => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Lightness => "Lightness",
            Self::Digital => "Digital",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Lightness => "lx",
            Self::Digital => "",
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} failed to {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor} timed out while trying to {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
}

/// A single transducer producing one numeric value per read.
pub trait Sensor {
    /// The quantity this sensor reports.
    fn kind(&self) -> SensorKind;

    /// Short hardware name used in logs (e.g. `"SHT40"`).
    fn name(&self) -> &'static str;

    /// Perform one measurement.
    fn read(&mut self) -> Result<f32, SensorError>;
}

/// One sample of one sensor. `value` is `None` when the sensor is disabled,
/// faulted, or produced a non-finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub kind: SensorKind,
    pub value: Option<f32>,
}

impl SensorSample {
    pub const fn absent(kind: SensorKind) -> Self {
        Self { kind, value: None }
    }

    pub const fn present(kind: SensorKind, value: f32) -> Self {
        Self {
            kind,
            value: Some(value),
        }
    }
}

/// Which sensor kinds are allowed to touch hardware.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SensorToggles {
    pub temperature: bool,
    pub humidity: bool,
    pub lightness: bool,
    pub digital: bool,
}

impl Default for SensorToggles {
    fn default() -> Self {
        Self {
            temperature: true,
            humidity: true,
            lightness: true,
            digital: true,
        }
    }
}

impl SensorToggles {
    pub const fn is_enabled(&self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::Temperature => self.temperature,
            SensorKind::Humidity => self.humidity,
            SensorKind::Lightness => self.lightness,
            SensorKind::Digital => self.digital,
        }
    }
}

/// A sensor slot: either a live sensor or a placeholder for a disabled one.
pub struct SensorReading<'a> {
    kind: SensorKind,
    source: Option<Box<dyn Sensor + 'a>>,
}

impl<'a> SensorReading<'a> {
    pub fn enabled<S: Sensor + 'a>(sensor: S) -> Self {
        Self {
            kind: sensor.kind(),
            source: Some(Box::new(sensor)),
        }
    }

    pub const fn disabled(kind: SensorKind) -> Self {
        Self { kind, source: None }
    }

    pub const fn kind(&self) -> SensorKind {
        self.kind
    }

    pub const fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// Sample the sensor. Never fails: every problem becomes an absent value.
    pub fn sample(&mut self) -> SensorSample {
        let Some(sensor) = self.source.as_mut() else {
            return SensorSample::absent(self.kind);
        };

        match sensor.read() {
            Ok(value) if value.is_finite() => {
                debug!(
                    "{}: {} = {} {}",
                    sensor.name(),
                    self.kind.label(),
                    value,
                    self.kind.unit()
                );
                SensorSample::present(self.kind, value)
            }
            Ok(value) => {
                warn!(
                    "{}: discarding non-finite {} reading ({})",
                    sensor.name(),
                    self.kind.label(),
                    value
                );
                SensorSample::absent(self.kind)
            }
            Err(e) => {
                error!("{}: {}", sensor.name(), e);
                SensorSample::absent(self.kind)
            }
        }
    }
}

/// The fixed set of sensors sampled each telemetry cycle, in install order.
pub struct SensorSuite<'a> {
    toggles: SensorToggles,
    readings: Vec<SensorReading<'a>>,
}

impl<'a> SensorSuite<'a> {
    pub const fn new(toggles: SensorToggles) -> Self {
        Self {
            toggles,
            readings: Vec::new(),
        }
    }

    /// Add a sensor. If its kind is disabled the sensor is dropped unused and
    /// a disabled slot takes its place.
    pub fn install<S: Sensor + 'a>(&mut self, sensor: S) -> &mut Self {
        let kind = sensor.kind();
        if self.toggles.is_enabled(kind) {
            self.readings.push(SensorReading::enabled(sensor));
        } else {
            debug!("{}: {} disabled by configuration", sensor.name(), kind.label());
            self.readings.push(SensorReading::disabled(kind));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Sample every slot in install order.
    pub fn sample_all(&mut self) -> Vec<SensorSample> {
        self.readings.iter_mut().map(SensorReading::sample).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSensor;

    #[test]
    fn test_disabled_reading_never_touches_hardware() {
        let sensor = FakeSensor::new(SensorKind::Temperature, &[Ok(21.5)]);
        let reads = sensor.reads();

        let mut suite = SensorSuite::new(SensorToggles {
            temperature: false,
            ..SensorToggles::default()
        });
        suite.install(sensor);

        assert_eq!(
            suite.sample_all(),
            [SensorSample::absent(SensorKind::Temperature)]
        );
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn test_fault_becomes_absent() {
        let mut reading = SensorReading::enabled(FakeSensor::new(
            SensorKind::Humidity,
            &[Err(SensorError::Timeout {
                sensor: "FAKE",
                operation: "measure",
            })],
        ));

        assert_eq!(reading.sample(), SensorSample::absent(SensorKind::Humidity));
    }

    #[test]
    fn test_non_finite_becomes_absent() {
        let mut reading = SensorReading::enabled(FakeSensor::new(
            SensorKind::Temperature,
            &[Ok(f32::NAN), Ok(f32::INFINITY)],
        ));

        assert_eq!(reading.sample().value, None);
        assert_eq!(reading.sample().value, None);
    }

    #[test]
    fn test_negative_values_are_real_readings() {
        let mut reading =
            SensorReading::enabled(FakeSensor::new(SensorKind::Temperature, &[Ok(-1.0)]));

        assert_eq!(
            reading.sample(),
            SensorSample::present(SensorKind::Temperature, -1.0)
        );
    }

    #[test]
    fn test_suite_samples_in_install_order() {
        let mut suite = SensorSuite::new(SensorToggles::default());
        suite
            .install(FakeSensor::new(SensorKind::Lightness, &[Ok(120.0)]))
            .install(FakeSensor::new(SensorKind::Temperature, &[Ok(19.0)]))
            .install(FakeSensor::new(SensorKind::Digital, &[Ok(1.0)]));

        let kinds: Vec<SensorKind> = suite.sample_all().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [
                SensorKind::Lightness,
                SensorKind::Temperature,
                SensorKind::Digital
            ]
        );
        assert_eq!(suite.len(), 3);
    }

    #[test]
    fn test_param_names() {
        assert_eq!(SensorKind::Temperature.param_name(), Some("temperature"));
        assert_eq!(SensorKind::Humidity.param_name(), Some("humidity"));
        assert_eq!(SensorKind::Lightness.param_name(), Some("lightness"));
        assert_eq!(SensorKind::Digital.param_name(), None);
    }
}
