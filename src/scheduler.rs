//! Cooperative single-threaded scheduler
//!
//! A [`Station`] owns every collaborator and advances the whole pipeline one
//! [`Station::tick`] at a time: inbound commands first, then the actuator
//! output, then a telemetry cycle when the sample period is due. Nothing here
//! blocks except the initial connect and the bounded HTTP request.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};

use crate::actuator::ActuatorOutput;
use crate::app_state::{RunState, StationError, StationState, describe};
use crate::clock::{Period, TickSource};
use crate::command::{self, Command, MAX_FRAME_LEN};
use crate::config::StationConfig;
use crate::network::{HttpClient, LinkState, MessageChannel, NetworkSession, WifiLink};
use crate::sensors::SensorSuite;
use crate::telemetry::{self, TelemetryFrame};

/// Upper bound on inbound frames handled in one tick, so a chatty broker
/// cannot starve telemetry.
pub const MAX_FRAMES_PER_TICK: usize = 8;

/// Sleep between ticks in [`Station::run`].
pub const IDLE_DELAY_MS: u32 = 10;

const HTTP_OK: u16 = 200;

/// What a single [`Station::tick`] did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// The link was up and I/O was serviced
    pub link_up: bool,
    /// Inbound frames taken off the command channel
    pub frames: usize,
    /// Frames that set the actuator
    pub applied: usize,
    /// Malformed or unrecognized frames
    pub dropped: usize,
    /// Outcome of the telemetry cycle, if one was due
    pub cycle: Option<Result<usize, StationError>>,
}

pub struct Station<'a, L, C, D, H, P, T> {
    config: StationConfig,
    session: NetworkSession<L, C, D>,
    sensors: SensorSuite<'a>,
    http: H,
    output: ActuatorOutput<P>,
    clock: T,
    state: StationState,
    sample_period: Period,
}

impl<'a, L, C, D, H, P, T> Station<'a, L, C, D, H, P, T>
where
    L: WifiLink,
    C: MessageChannel,
    D: DelayNs,
    H: HttpClient,
    P: OutputPin,
    T: TickSource,
{
    pub fn new(
        config: StationConfig,
        mut session: NetworkSession<L, C, D>,
        sensors: SensorSuite<'a>,
        http: H,
        output: ActuatorOutput<P>,
        clock: T,
    ) -> Self {
        if let Some(endpoint) = &config.commands {
            session.attach_channel(endpoint.clone());
        }
        let sample_period = Period::new(config.sample_period_ms, clock.now_ms());

        Self {
            config,
            session,
            sensors,
            http,
            output,
            clock,
            state: StationState::new(),
            sample_period,
        }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn state(&self) -> &StationState {
        &self.state
    }

    pub fn session(&self) -> &NetworkSession<L, C, D> {
        &self.session
    }

    /// Join the network (blocking), show the initial actuator state and arm
    /// the sample period.
    pub fn start(&mut self) {
        info!(
            "Starting station '{}' ({} sensors)",
            self.config.device_name,
            self.sensors.len()
        );

        self.state.run_state = RunState::WifiConnecting;
        self.session.connect(&self.config.wifi);

        self.apply_output();
        self.sample_period.rearm(self.clock.now_ms());
        self.state.run_state = RunState::Running;
    }

    /// Run one pass of the loop.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        if !self.session.is_connected() {
            self.state.run_state = RunState::WifiConnecting;
            if self.session.step(&self.config.wifi) == LinkState::Connected {
                self.state.run_state = RunState::Running;
            }
            return report;
        }
        report.link_up = true;

        let mut buf = [0u8; MAX_FRAME_LEN];
        while report.frames < MAX_FRAMES_PER_TICK {
            match self.session.poll(self.clock.now_ms(), &mut buf) {
                Ok(Some(len)) => {
                    report.frames += 1;
                    match self.dispatch(&buf[..len]) {
                        Ok(Command::SetActuator(_)) => report.applied += 1,
                        Ok(Command::Unrecognized { .. }) | Err(_) => report.dropped += 1,
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Command: {}", e);
                    break;
                }
            }
        }

        self.apply_output();

        if self.config.telemetry.is_some() && self.sample_period.poll(self.clock.now_ms()) {
            let outcome = self.run_cycle();
            match &outcome {
                Ok(pairs) => debug!("HTTP: delivered {} readings", pairs),
                Err(e) => warn!("HTTP: telemetry cycle dropped: {}", e),
            }
            report.cycle = Some(outcome);
        }

        report
    }

    /// Decode one inbound frame and fold it into the actuator state.
    pub fn dispatch(&mut self, raw: &[u8]) -> Result<Command, StationError> {
        let command = match command::decode(raw) {
            Ok(command) => command,
            Err(e) => {
                warn!("Command: dropping frame: {}", e);
                self.state.frames_dropped = self.state.frames_dropped.wrapping_add(1);
                return Err(e.into());
            }
        };

        match command {
            Command::SetActuator(next) => {
                if command.apply(&mut self.state.actuator) {
                    info!("Command: actuator {}", if next.on { "on" } else { "off" });
                }
                self.state.frames_applied = self.state.frames_applied.wrapping_add(1);
            }
            Command::Unrecognized { kind } => {
                debug!("Command: ignoring frame type {}", kind);
                self.state.frames_dropped = self.state.frames_dropped.wrapping_add(1);
            }
        }

        Ok(command)
    }

    /// Sample every sensor, encode the present readings and send them.
    ///
    /// Returns the number of readings delivered. A failed cycle is not
    /// retried; the next one samples fresh values.
    pub fn run_cycle(&mut self) -> Result<usize, StationError> {
        let Some(endpoint) = self.config.telemetry.as_ref() else {
            return Ok(0);
        };
        if !self.session.is_connected() {
            return Err(StationError::LinkDown);
        }
        self.state.cycles_attempted = self.state.cycles_attempted.wrapping_add(1);

        let samples = self.sensors.sample_all();
        let frame = TelemetryFrame::from_samples(&samples);
        let target = telemetry::encode(endpoint, &self.config.device_name, &frame)?;

        debug!("HTTP: GET {}:{}{}", endpoint.host, endpoint.port, target);
        let status = self
            .http
            .get(endpoint, &target, self.config.io_timeout_ms)
            .map_err(|e| StationError::Http(describe(&e)))?;
        if status != HTTP_OK {
            return Err(StationError::HttpStatus(status));
        }

        self.state.cycles_delivered = self.state.cycles_delivered.wrapping_add(1);
        Ok(frame.len())
    }

    /// Start the station and tick forever.
    pub fn run(mut self) -> ! {
        self.start();
        loop {
            self.tick();
            self.session.pause(IDLE_DELAY_MS);
        }
    }

    fn apply_output(&mut self) {
        if let Err(e) = self.output.apply(self.state.actuator) {
            error!("{}", StationError::Actuator(describe(&e)));
        }
    }
}
