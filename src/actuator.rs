//! Actuator state and the pin that displays it

use embedded_hal::digital::{OutputPin, PinState};

/// State of the single actuator (an LED). Defaults to off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorState {
    pub on: bool,
}

impl ActuatorState {
    pub const OFF: Self = Self { on: false };
    pub const ON: Self = Self { on: true };

    /// Wire encoding: `0` is off, anything else is on.
    pub const fn from_wire(byte: u8) -> Self {
        Self { on: byte != 0 }
    }

    pub const fn to_wire(self) -> u8 {
        self.on as u8
    }
}

/// Drives an output pin from an [`ActuatorState`].
///
/// The pin is written on the first apply and afterwards only when the state
/// changes.
pub struct ActuatorOutput<P> {
    pin: P,
    active_low: bool,
    applied: Option<ActuatorState>,
}

impl<P: OutputPin> ActuatorOutput<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            applied: None,
        }
    }

    /// The state last written to the pin, if any.
    pub fn applied(&self) -> Option<ActuatorState> {
        self.applied
    }

    pub fn apply(&mut self, state: ActuatorState) -> Result<(), P::Error> {
        if self.applied == Some(state) {
            return Ok(());
        }

        let level = PinState::from(state.on != self.active_low);
        self.pin.set_state(level)?;
        self.applied = Some(state);
        Ok(())
    }
}
