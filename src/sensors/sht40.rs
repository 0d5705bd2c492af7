use embedded_hal::{delay::DelayNs, i2c::I2c};
use log::error;
use sht4x::{Precision, Sht4x};

use super::{Sensor, SensorError, SensorKind};

/// Which of the two SHT40 outputs a [`Sht40Sensor`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sht40Channel {
    Temperature,
    Humidity,
}

/// One channel of an SHT40 temperature/humidity sensor.
///
/// The chip measures both quantities in one transaction; temperature and
/// humidity are still separate sensors so each can be enabled on its own.
/// Two instances can share one bus through an `embedded-hal-bus` device
/// wrapper.
pub struct Sht40Sensor<I, D> {
    sensor: Sht4x<I, D>,
    delay: D,
    channel: Sht40Channel,
}

impl<I: I2c, D: DelayNs> Sht40Sensor<I, D> {
    pub fn new(i2c: I, delay: D, channel: Sht40Channel) -> Self {
        Self {
            sensor: Sht4x::<I, D>::new(i2c),
            delay,
            channel,
        }
    }

    pub fn temperature(i2c: I, delay: D) -> Self {
        Self::new(i2c, delay, Sht40Channel::Temperature)
    }

    pub fn humidity(i2c: I, delay: D) -> Self {
        Self::new(i2c, delay, Sht40Channel::Humidity)
    }
}

impl<I: I2c, D: DelayNs> Sensor for Sht40Sensor<I, D> {
    fn kind(&self) -> SensorKind {
        match self.channel {
            Sht40Channel::Temperature => SensorKind::Temperature,
            Sht40Channel::Humidity => SensorKind::Humidity,
        }
    }

    fn name(&self) -> &'static str {
        "SHT40"
    }

    fn read(&mut self) -> Result<f32, SensorError> {
        let measurement = self
            .sensor
            .measure(Precision::High, &mut self.delay)
            .map_err(|e| {
                error!("SHT40 measurement failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: "SHT40",
                    operation: "measure temperature/humidity",
                    details: "I2C communication error or sensor not responding",
                }
            })?;

        Ok(match self.channel {
            Sht40Channel::Temperature => measurement.temperature_celsius().to_num::<f32>(),
            Sht40Channel::Humidity => measurement.humidity_percent().to_num::<f32>(),
        })
    }
}
