//! Station-wide state and error types

use core::fmt::{Debug, Write};

use thiserror_no_std::Error;

use crate::actuator::ActuatorState;
use crate::command::CommandError;
use crate::telemetry::EncodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Uninitialized,
    WifiConnecting,
    Running,
}

/// Mutable state of a running station.
///
/// Owned by the [`Station`](crate::scheduler::Station); the actuator state is
/// written only by command dispatch and read only by the output step, both on
/// the scheduler's single thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationState {
    pub run_state: RunState,
    pub actuator: ActuatorState,
    pub cycles_attempted: u32,
    pub cycles_delivered: u32,
    pub frames_applied: u32,
    pub frames_dropped: u32,
}

impl StationState {
    pub const fn new() -> Self {
        Self {
            run_state: RunState::Uninitialized,
            actuator: ActuatorState::OFF,
            cycles_attempted: 0,
            cycles_delivered: 0,
            frames_applied: 0,
            frames_dropped: 0,
        }
    }
}

impl Default for StationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Short human-readable error detail, truncated to fit.
pub type ErrorDetail = heapless::String<64>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StationError {
    #[error("WiFi link is down")]
    LinkDown,
    #[error("Command channel error: {0}")]
    Channel(ErrorDetail),
    #[error("HTTP transport error: {0}")]
    Http(ErrorDetail),
    #[error("HTTP request rejected with status {0}")]
    HttpStatus(u16),
    #[error("Telemetry encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("Malformed command frame: {0}")]
    Command(#[from] CommandError),
    #[error("Actuator output error: {0}")]
    Actuator(ErrorDetail),
}

/// Copy a message into an [`ErrorDetail`], keeping whatever fits.
pub fn detail(message: &str) -> ErrorDetail {
    let mut detail = ErrorDetail::new();
    for c in message.chars() {
        if detail.push(c).is_err() {
            break;
        }
    }
    detail
}

/// Render a driver error's `Debug` output into an [`ErrorDetail`], keeping
/// whatever fits.
pub fn describe<E: Debug>(error: &E) -> ErrorDetail {
    let mut detail = ErrorDetail::new();
    let _ = write!(detail, "{:?}", error);
    detail
}
