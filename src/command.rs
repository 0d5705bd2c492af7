//! Inbound command frames
//!
//! Frames arrive whole on the command channel with the layout
//! `[type:u8][payload...]`. Only [`LED_UPDATE`] is defined: its first payload
//! byte is the new actuator state. Unknown types decode to
//! [`Command::Unrecognized`] so newer brokers can add commands without older
//! devices treating them as errors.

use thiserror_no_std::Error;

use crate::actuator::ActuatorState;

/// Set the actuator state from `payload[0]`.
pub const LED_UPDATE: u8 = 1;

/// No frame type is shorter than a type byte plus one payload byte.
pub const MIN_FRAME_LEN: usize = 2;

/// Largest frame the device buffers; longer frames are truncated by the channel.
pub const MAX_FRAME_LEN: usize = 64;

/// A received frame split into its type byte and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame<'a> {
    pub kind: u8,
    pub payload: &'a [u8],
}

impl<'a> CommandFrame<'a> {
    pub fn parse(raw: &'a [u8]) -> Result<Self, CommandError> {
        match raw {
            [kind, payload @ ..] if raw.len() >= MIN_FRAME_LEN => Ok(Self {
                kind: *kind,
                payload,
            }),
            _ => Err(CommandError::Truncated {
                len: raw.len(),
                min: MIN_FRAME_LEN,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetActuator(ActuatorState),
    /// A well-formed frame of a type this firmware does not know.
    Unrecognized { kind: u8 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("frame is {len} bytes, minimum is {min}")]
    Truncated { len: usize, min: usize },
}

pub fn decode(raw: &[u8]) -> Result<Command, CommandError> {
    let frame = CommandFrame::parse(raw)?;

    match frame.kind {
        LED_UPDATE => match frame.payload.first() {
            Some(&state) => Ok(Command::SetActuator(ActuatorState::from_wire(state))),
            None => Err(CommandError::Truncated {
                len: raw.len(),
                min: MIN_FRAME_LEN,
            }),
        },
        kind => Ok(Command::Unrecognized { kind }),
    }
}

impl Command {
    /// Apply the command to `state`. Returns `true` if the state changed.
    pub fn apply(self, state: &mut ActuatorState) -> bool {
        match self {
            Self::SetActuator(next) => {
                let changed = *state != next;
                *state = next;
                changed
            }
            Self::Unrecognized { .. } => false,
        }
    }
}
