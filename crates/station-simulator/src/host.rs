//! Host implementations of the station-node hardware and transport traits.

use std::convert::Infallible;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, info};
use tungstenite::{Message, WebSocket};

use station_node::clock::TickSource;
use station_node::config::{EndpointAddress, WifiCredentials};
use station_node::network::{HttpClient, LinkAddress, MacAddress, MessageChannel, WifiLink};
use station_node::sensors::{Sensor, SensorError, SensorKind};

/// Millisecond counter since simulator start, wrapping like the device's.
pub struct HostClock {
    started: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl TickSource for HostClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap.
        self.started.elapsed().as_millis() as u32
    }
}

pub struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// A radio that associates after a fixed number of status checks.
pub struct SimulatedLink {
    checks_needed: u32,
    checks: u32,
}

impl SimulatedLink {
    pub fn new(checks_needed: u32) -> Self {
        Self {
            checks_needed,
            checks: 0,
        }
    }
}

impl WifiLink for SimulatedLink {
    type Error = Infallible;

    fn begin(&mut self, credentials: &WifiCredentials) -> Result<(), Infallible> {
        info!("SIM: associating with '{}'", credentials.ssid);
        self.checks = 0;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.checks = self.checks.saturating_add(1);
        self.checks >= self.checks_needed
    }

    fn address(&self) -> Option<LinkAddress> {
        Some(LinkAddress {
            ip: Ipv4Addr::LOCALHOST,
            // Locally administered
            mac: MacAddress([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]),
        })
    }
}

/// Blocking HTTP GET over `reqwest`.
pub struct HttpGetClient {
    client: reqwest::blocking::Client,
}

impl HttpGetClient {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client })
    }
}

impl HttpClient for HttpGetClient {
    type Error = reqwest::Error;

    fn get(
        &mut self,
        endpoint: &EndpointAddress,
        target: &str,
        timeout_ms: u32,
    ) -> Result<u16, reqwest::Error> {
        let url = format!("http://{}:{}{}", endpoint.host, endpoint.port, target);
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_millis(timeout_ms.into()))
            .send()?;
        Ok(response.status().as_u16())
    }
}

/// Command channel over a websocket: each binary message is one frame.
pub struct WsCommandChannel {
    socket: Option<WebSocket<TcpStream>>,
    connect_timeout: Duration,
}

impl WsCommandChannel {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            socket: None,
            connect_timeout,
        }
    }
}

impl MessageChannel for WsCommandChannel {
    type Error = anyhow::Error;

    fn open(&mut self, endpoint: &EndpointAddress) -> anyhow::Result<()> {
        self.socket = None;

        let url = format!("ws://{}:{}{}", endpoint.host, endpoint.port, endpoint.path);
        let addr = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow!("{} did not resolve", endpoint.host))?;

        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout)?;
        // Bound the upgrade handshake, then switch to polling.
        stream.set_read_timeout(Some(self.connect_timeout))?;
        let (socket, response) = tungstenite::client(url.as_str(), stream)
            .map_err(|e| anyhow!("websocket handshake with {url} failed: {e}"))?;
        socket.get_ref().set_nonblocking(true)?;

        debug!("SIM: websocket upgrade answered {}", response.status());
        self.socket = Some(socket);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn receive(&mut self, buf: &mut [u8]) -> anyhow::Result<Option<usize>> {
        let Some(socket) = self.socket.as_mut() else {
            return Ok(None);
        };

        loop {
            match socket.read() {
                Ok(Message::Binary(payload)) => {
                    let n = payload.len().min(buf.len());
                    buf[..n].copy_from_slice(&payload[..n]);
                    return Ok(Some(n));
                }
                Ok(Message::Close(frame)) => {
                    info!("SIM: broker closed the websocket: {:?}", frame);
                    self.socket = None;
                    return Ok(None);
                }
                // Text and control frames carry no commands; pongs are queued
                // by tungstenite itself.
                Ok(_) => continue,
                Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => {
                    return Ok(None);
                }
                Err(e) => {
                    self.socket = None;
                    return Err(e.into());
                }
            }
        }
    }
}

/// Generates synthetic readings that vary over time, failing every
/// `fault_every` reads so the absent-value path gets exercised.
pub struct SyntheticSensor {
    kind: SensorKind,
    started: Instant,
    fault_every: u32,
    reads: u32,
}

impl SyntheticSensor {
    pub fn new(kind: SensorKind, fault_every: u32) -> Self {
        Self {
            kind,
            started: Instant::now(),
            fault_every,
            reads: 0,
        }
    }
}

impl Sensor for SyntheticSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        "SIM"
    }

    fn read(&mut self) -> Result<f32, SensorError> {
        self.reads = self.reads.wrapping_add(1);
        if self.fault_every != 0 && self.reads % self.fault_every == 0 {
            return Err(SensorError::Timeout {
                sensor: "SIM",
                operation: "measure",
            });
        }

        let t = self.started.elapsed().as_secs_f64();
        let value = match self.kind {
            // 20-26 °C with slow drift
            SensorKind::Temperature => 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos(),
            SensorKind::Humidity => 50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos(),
            SensorKind::Lightness => 300.0 + 250.0 * (t / 90.0).sin(),
            SensorKind::Digital => ((t / 30.0) as u64 % 2) as f64,
        };
        Ok(value as f32)
    }
}

/// Stands in for the LED pin by logging level changes.
pub struct LoggedLed;

impl ErrorType for LoggedLed {
    type Error = Infallible;
}

impl OutputPin for LoggedLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        info!("LED: pin low");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        info!("LED: pin high");
        Ok(())
    }
}
