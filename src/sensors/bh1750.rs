use bh1750_embedded::{Address, Resolution, blocking::Bh1750};
use embedded_hal::{delay::DelayNs, i2c::I2c};
use log::{error, info};

use super::{Sensor, SensorError, SensorKind};

pub use bh1750_embedded::Address as Bh1750Address;

/// BH1750 ambient light sensor in one-time high resolution mode.
///
/// The chip powers down after each one-time measurement, so every read is a
/// full power-on, measure, read sequence.
pub struct Bh1750Sensor<I, D> {
    sensor: Bh1750<I, D>,
}

impl<I: I2c, D: DelayNs> Bh1750Sensor<I, D> {
    /// Sensor with the ADDR pin tied low.
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_address(i2c, delay, Address::Low)
    }

    pub fn with_address(i2c: I, delay: D, address: Address) -> Self {
        Self {
            sensor: Bh1750::<I, D>::new(i2c, delay, address),
        }
    }
}

impl<I: I2c, D: DelayNs> Sensor for Bh1750Sensor<I, D> {
    fn kind(&self) -> SensorKind {
        SensorKind::Lightness
    }

    fn name(&self) -> &'static str {
        "BH1750"
    }

    fn read(&mut self) -> Result<f32, SensorError> {
        self.sensor
            .one_time_measurement(Resolution::High)
            .inspect(|lux| info!("BH1750: Measured lux = {}", lux))
            .map_err(|e| {
                error!("BH1750 one_time_measurement failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: "BH1750",
                    operation: "one_time_measurement",
                    details: "I2C communication error or sensor not responding",
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDelay, FakeI2c};

    const ADDR_LOW: u8 = 0x23;
    const ADDR_HIGH: u8 = 0x5C;

    #[test]
    fn test_lux_conversion() {
        let i2c = FakeI2c::new();
        i2c.queue_read(&[0x01, 0x2C]); // 300 counts
        let writes = i2c.writes();

        let mut sensor = Bh1750Sensor::new(i2c, FakeDelay::new());
        let lux = sensor.read().unwrap();

        // High resolution mode: lux = counts / 1.2
        assert!((lux - 250.0).abs() < 0.5, "lux = {lux}");
        assert!(!writes.borrow().is_empty());
        assert!(writes.borrow().iter().all(|(addr, _)| *addr == ADDR_LOW));
    }

    #[test]
    fn test_alternate_address() {
        let i2c = FakeI2c::new();
        i2c.queue_read(&[0x00, 0x00]);
        let writes = i2c.writes();

        let mut sensor = Bh1750Sensor::with_address(i2c, FakeDelay::new(), Bh1750Address::High);
        assert_eq!(sensor.read(), Ok(0.0));
        assert!(writes.borrow().iter().all(|(addr, _)| *addr == ADDR_HIGH));
    }

    #[test]
    fn test_bus_fault_is_read_failed() {
        let mut sensor = Bh1750Sensor::new(FakeI2c::failing(), FakeDelay::new());

        assert!(matches!(
            sensor.read(),
            Err(SensorError::ReadFailed {
                sensor: "BH1750",
                ..
            })
        ));
    }
}
