//! Network session: WiFi association, command channel and HTTP transport
//!
//! The radio driver, TCP/IP stack and socket types are external; this module
//! only defines the capabilities the pipeline consumes and the reconnect
//! policy on top of them.

use core::convert::Infallible;
use core::fmt::{self, Debug, Display};
use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app_state::{StationError, describe, detail};
use crate::clock::Period;
use crate::config::{EndpointAddress, WifiCredentials};

/// Fixed delay between association checks while joining.
pub const RETRY_DELAY_MS: u32 = 500;

/// Minimum spacing between attempts to re-open a closed command channel.
pub const REOPEN_INTERVAL_MS: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Addresses assigned to the station once associated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkAddress {
    pub ip: Ipv4Addr,
    pub mac: MacAddress,
}

/// A wireless link that can be told to join a network.
pub trait WifiLink {
    type Error: Debug;

    /// Start associating with the network. Completion is observed through
    /// [`WifiLink::is_connected`].
    fn begin(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error>;

    fn is_connected(&mut self) -> bool;

    /// IP and MAC address of the station, if the driver knows them.
    fn address(&self) -> Option<LinkAddress> {
        None
    }
}

/// A persistent, message-oriented connection delivering whole frames.
pub trait MessageChannel {
    type Error: Debug;

    fn open(&mut self, endpoint: &EndpointAddress) -> Result<(), Self::Error>;

    fn is_open(&self) -> bool;

    /// Copy the next pending frame into `buf` without blocking.
    ///
    /// Returns `Ok(None)` when nothing is queued. Frames longer than `buf`
    /// are truncated.
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;
}

/// An HTTP client able to issue a GET with a bounded timeout.
pub trait HttpClient {
    type Error: Debug;

    /// Send `GET <target>` to `endpoint` and return the response status.
    ///
    /// The whole exchange must fail rather than block past `timeout_ms`.
    fn get(
        &mut self,
        endpoint: &EndpointAddress,
        target: &str,
        timeout_ms: u32,
    ) -> Result<u16, Self::Error>;
}

/// Command channel for devices without the command role. Never opens.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullChannel;

impl MessageChannel for NullChannel {
    type Error = Infallible;

    fn open(&mut self, _endpoint: &EndpointAddress) -> Result<(), Infallible> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        false
    }

    fn receive(&mut self, _buf: &mut [u8]) -> Result<Option<usize>, Infallible> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Joining { attempt: u32 },
    Connected,
}

/// Owns the WiFi link and the command channel.
pub struct NetworkSession<L, C, D> {
    link: L,
    channel: C,
    delay: D,
    retry_delay_ms: u32,
    state: LinkState,
    command_endpoint: Option<EndpointAddress>,
    reopen: Period,
}

impl<L, C, D> NetworkSession<L, C, D>
where
    L: WifiLink,
    C: MessageChannel,
    D: DelayNs,
{
    pub fn new(link: L, channel: C, delay: D) -> Self {
        Self {
            link,
            channel,
            delay,
            retry_delay_ms: RETRY_DELAY_MS,
            state: LinkState::Idle,
            command_endpoint: None,
            reopen: Period::new(REOPEN_INTERVAL_MS, 0),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay_ms: u32) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Register the command broker. The channel is opened every time the
    /// link comes up.
    pub fn attach_channel(&mut self, endpoint: EndpointAddress) {
        self.command_endpoint = Some(endpoint);
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Addresses reported by the link while connected.
    pub fn address(&self) -> Option<LinkAddress> {
        match self.state {
            LinkState::Connected => self.link.address(),
            _ => None,
        }
    }

    /// Query the link. A lost link drops the session back to `Idle` so the
    /// next [`NetworkSession::step`] starts a new join.
    pub fn is_connected(&mut self) -> bool {
        let up = self.link.is_connected();
        if !up && self.state == LinkState::Connected {
            warn!("WiFi: link lost");
            self.state = LinkState::Idle;
        }
        up && self.state == LinkState::Connected
    }

    /// Advance the join state machine by one transition.
    ///
    /// Blocks for at most one retry delay.
    pub fn step(&mut self, credentials: &WifiCredentials) -> LinkState {
        self.state = match self.state {
            LinkState::Idle => {
                info!("WiFi: connecting to {}", credentials.ssid);
                match self.link.begin(credentials) {
                    Ok(()) => LinkState::Joining { attempt: 1 },
                    Err(e) => {
                        warn!("WiFi: begin failed: {:?}", e);
                        self.delay.delay_ms(self.retry_delay_ms);
                        LinkState::Idle
                    }
                }
            }
            LinkState::Joining { attempt } => {
                if self.link.is_connected() {
                    info!("WiFi: connected after {} checks", attempt);
                    if let Some(address) = self.link.address() {
                        info!("WiFi: IP address: {}", address.ip);
                        info!("WiFi: MAC address: {}", address.mac);
                    }
                    self.open_channel();
                    LinkState::Connected
                } else {
                    self.delay.delay_ms(self.retry_delay_ms);
                    LinkState::Joining {
                        attempt: attempt.saturating_add(1),
                    }
                }
            }
            LinkState::Connected => LinkState::Connected,
        };
        self.state
    }

    /// Block until the link is up, retrying forever with a fixed delay.
    pub fn connect(&mut self, credentials: &WifiCredentials) {
        while self.step(credentials) != LinkState::Connected {}
    }

    /// Sleep on the session's delay provider.
    pub fn pause(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Service the command channel without blocking.
    ///
    /// Returns the length of a received frame copied into `buf`. A closed
    /// channel is re-opened at most every [`REOPEN_INTERVAL_MS`].
    pub fn poll(&mut self, now_ms: u32, buf: &mut [u8]) -> Result<Option<usize>, StationError> {
        if self.command_endpoint.is_none() || self.state != LinkState::Connected {
            return Ok(None);
        }

        if !self.channel.is_open() {
            if !self.reopen.poll(now_ms) {
                return Ok(None);
            }
            if !self.open_channel() {
                return Err(StationError::Channel(detail("re-open failed")));
            }
        }

        self.channel
            .receive(buf)
            .map_err(|e| StationError::Channel(describe(&e)))
    }

    fn open_channel(&mut self) -> bool {
        let Some(endpoint) = self.command_endpoint.as_ref() else {
            return false;
        };

        info!(
            "Command: opening channel to {}:{}{}",
            endpoint.host, endpoint.port, endpoint.path
        );
        match self.channel.open(endpoint) {
            Ok(()) => true,
            Err(e) => {
                warn!("Command: open failed: {:?}", e);
                false
            }
        }
    }
}
