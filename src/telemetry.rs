//! Telemetry request encoding
//!
//! Present readings are reported as query parameters of an HTTP GET:
//!
//! ```text
//! <path>?name=<device>[&temperature=<v>][&humidity=<v>][&lightness=<v>]
//! ```
//!
//! The request target is built in a bounded [`heapless::String`]; a target
//! that does not fit is an error, never a truncated request.

use core::fmt::Write;

use thiserror_no_std::Error;

use crate::config::EndpointAddress;
use crate::sensors::{SensorKind, SensorSample};

/// Longest request target the transport accepts.
pub const MAX_REQUEST_TARGET_LEN: usize = 255;

/// Fractional digits used when rendering readings.
pub const VALUE_PRECISION: usize = 6;

/// Query parameter carrying the device identity.
pub const IDENTITY_PARAM: &str = "name";

const MAX_PAIRS: usize = SensorKind::TELEMETRY_ORDER.len();

/// A request target that fits the transport limit.
pub type RequestTarget = heapless::String<MAX_REQUEST_TARGET_LEN>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    #[error("request target does not fit in {limit} bytes")]
    TargetTooLong { limit: usize },
    #[error("device name must be at least 2 URL-unreserved characters")]
    InvalidDeviceName,
}

/// Device names go into the query verbatim, so they are limited to RFC 3986
/// unreserved characters. The server ignores names shorter than two
/// characters.
pub fn is_valid_device_name(name: &str) -> bool {
    name.len() >= 2
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'))
}

/// Present readings of one sampling tick, in telemetry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    pairs: heapless::Vec<(SensorKind, f32), MAX_PAIRS>,
}

impl TelemetryFrame {
    /// Collect the present samples, ordered temperature, humidity, lightness.
    ///
    /// Absent samples and kinds without a wire name are skipped. When a kind
    /// appears more than once, the first present sample wins.
    pub fn from_samples(samples: &[SensorSample]) -> Self {
        let mut pairs = heapless::Vec::new();

        for kind in SensorKind::TELEMETRY_ORDER {
            let value = samples
                .iter()
                .filter(|sample| sample.kind == kind)
                .find_map(|sample| sample.value);

            if let Some(value) = value {
                // One slot per telemetry kind, so this cannot overflow.
                let _ = pairs.push((kind, value));
            }
        }

        Self { pairs }
    }

    pub fn get(&self, kind: SensorKind) -> Option<f32> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `(parameter name, value)` pairs in wire order.
    pub fn params(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.pairs
            .iter()
            .filter_map(|(kind, value)| kind.param_name().map(|name| (name, *value)))
    }
}

/// Encode a frame into a request target of at most [`MAX_REQUEST_TARGET_LEN`]
/// bytes.
pub fn encode(
    endpoint: &EndpointAddress,
    device_name: &str,
    frame: &TelemetryFrame,
) -> Result<RequestTarget, EncodeError> {
    encode_bounded(endpoint, device_name, frame)
}

/// Encode a frame into a request target of at most `N` bytes.
///
/// An empty frame still produces the identity parameter: the server treats
/// the request as a liveness signal. A device name that could add or split
/// query parameters is rejected.
pub fn encode_bounded<const N: usize>(
    endpoint: &EndpointAddress,
    device_name: &str,
    frame: &TelemetryFrame,
) -> Result<heapless::String<N>, EncodeError> {
    if !is_valid_device_name(device_name) {
        return Err(EncodeError::InvalidDeviceName);
    }

    let overflow = |_| EncodeError::TargetTooLong { limit: N };
    let mut target = heapless::String::<N>::new();

    write!(target, "{}?{}={}", endpoint.path, IDENTITY_PARAM, device_name).map_err(overflow)?;

    for (name, value) in frame.params() {
        write!(target, "&{}={:.*}", name, VALUE_PRECISION, value).map_err(overflow)?;
    }

    Ok(target)
}
