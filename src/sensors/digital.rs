use embedded_hal::digital::InputPin;
use log::error;

use super::{Sensor, SensorError, SensorKind};

/// A digital input reported as `1.0` (asserted) or `0.0`.
pub struct DigitalSensor<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> DigitalSensor<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// Treat a low level as asserted (e.g. a switch pulled up to VCC).
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }
}

impl<P: InputPin> Sensor for DigitalSensor<P> {
    fn kind(&self) -> SensorKind {
        SensorKind::Digital
    }

    fn name(&self) -> &'static str {
        "GPIO"
    }

    fn read(&mut self) -> Result<f32, SensorError> {
        let high = self.pin.is_high().map_err(|e| {
            error!("GPIO input read failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: "GPIO",
                operation: "read input level",
                details: "pin driver returned an error",
            }
        })?;

        Ok(if high != self.active_low { 1.0 } else { 0.0 })
    }
}
