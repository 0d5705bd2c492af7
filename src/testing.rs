//! Test doubles for the hardware and transport traits.
//!
//! Every fake hands out `Rc` handles to its internals so tests can keep
//! observing side effects after the fake has been moved into a sensor,
//! session or station.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};

use crate::clock::TickSource;
use crate::config::{EndpointAddress, WifiCredentials};
use crate::network::{HttpClient, LinkAddress, MessageChannel, WifiLink};
use crate::sensors::{Sensor, SensorError, SensorKind};

/// I2C bus that records writes and answers reads from a queue.
pub struct FakeI2c {
    fail: bool,
    reads: Rc<RefCell<VecDeque<Vec<u8>>>>,
    writes: Rc<RefCell<Vec<(u8, Vec<u8>)>>>,
}

impl FakeI2c {
    pub fn new() -> Self {
        Self {
            fail: false,
            reads: Rc::default(),
            writes: Rc::default(),
        }
    }

    /// A bus on which every transaction is NACKed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn queue_read(&self, bytes: &[u8]) {
        self.reads.borrow_mut().push_back(bytes.to_vec());
    }

    pub fn writes(&self) -> Rc<RefCell<Vec<(u8, Vec<u8>)>>> {
        Rc::clone(&self.writes)
    }
}

impl i2c::ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    self.writes.borrow_mut().push((address, bytes.to_vec()));
                }
                Operation::Read(buf) => {
                    let data = self
                        .reads
                        .borrow_mut()
                        .pop_front()
                        .ok_or(ErrorKind::Other)?;
                    let n = buf.len().min(data.len());
                    buf[..n].copy_from_slice(&data[..n]);
                }
            }
        }
        Ok(())
    }
}

/// Delay that only accumulates the requested time.
pub struct FakeDelay {
    total_ns: Rc<Cell<u64>>,
}

impl FakeDelay {
    pub fn new() -> Self {
        Self {
            total_ns: Rc::default(),
        }
    }

    pub fn total_ns(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.total_ns)
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

pub struct FakeInputPin {
    high: bool,
    broken: bool,
}

impl FakeInputPin {
    pub fn high() -> Self {
        Self {
            high: true,
            broken: false,
        }
    }

    pub fn low() -> Self {
        Self {
            high: false,
            broken: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            high: false,
            broken: true,
        }
    }
}

impl digital::ErrorType for FakeInputPin {
    type Error = digital::ErrorKind;
}

impl InputPin for FakeInputPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.broken {
            Err(digital::ErrorKind::Other)
        } else {
            Ok(self.high)
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Output pin recording every level written (`true` = high).
pub struct FakeOutputPin {
    levels: Rc<RefCell<Vec<bool>>>,
}

impl FakeOutputPin {
    pub fn new() -> Self {
        Self {
            levels: Rc::default(),
        }
    }

    pub fn levels(&self) -> Rc<RefCell<Vec<bool>>> {
        Rc::clone(&self.levels)
    }
}

impl digital::ErrorType for FakeOutputPin {
    type Error = Infallible;
}

impl OutputPin for FakeOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

/// Sensor replaying scripted results, then failing once the script runs out.
pub struct FakeSensor {
    kind: SensorKind,
    script: VecDeque<Result<f32, SensorError>>,
    reads: Rc<Cell<u32>>,
}

impl FakeSensor {
    pub fn new(kind: SensorKind, script: &[Result<f32, SensorError>]) -> Self {
        Self {
            kind,
            script: script.iter().copied().collect(),
            reads: Rc::default(),
        }
    }

    /// A sensor that reports `value` on every read.
    pub fn constant(kind: SensorKind, value: f32) -> Self {
        Self::new(kind, &[Ok(value); 64])
    }

    pub fn reads(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.reads)
    }
}

impl Sensor for FakeSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        "FAKE"
    }

    fn read(&mut self) -> Result<f32, SensorError> {
        self.reads.set(self.reads.get() + 1);
        self.script.pop_front().unwrap_or(Err(SensorError::Timeout {
            sensor: "FAKE",
            operation: "replay script",
        }))
    }
}

/// Link that reports connected after `up_after` checks following each `begin`.
pub struct FakeLink {
    up_after: u32,
    checks: u32,
    address: Option<LinkAddress>,
    failing_begins: Rc<Cell<u32>>,
    begin_calls: Rc<Cell<u32>>,
    down: Rc<Cell<bool>>,
}

impl FakeLink {
    pub fn up_after(checks: u32) -> Self {
        Self {
            up_after: checks,
            checks: 0,
            address: None,
            failing_begins: Rc::default(),
            begin_calls: Rc::default(),
            down: Rc::default(),
        }
    }

    pub fn with_address(mut self, address: LinkAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Make the next `count` calls to `begin` fail.
    pub fn fail_begins(&self, count: u32) {
        self.failing_begins.set(count);
    }

    pub fn begin_calls(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.begin_calls)
    }

    /// While set, the link reports disconnected.
    pub fn down_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.down)
    }
}

impl WifiLink for FakeLink {
    type Error = &'static str;

    fn begin(&mut self, _credentials: &WifiCredentials) -> Result<(), Self::Error> {
        self.begin_calls.set(self.begin_calls.get() + 1);
        self.checks = 0;

        let failing = self.failing_begins.get();
        if failing > 0 {
            self.failing_begins.set(failing - 1);
            return Err("radio busy");
        }
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.checks = self.checks.saturating_add(1);
        !self.down.get() && self.checks >= self.up_after
    }

    fn address(&self) -> Option<LinkAddress> {
        self.address
    }
}

/// Command channel fed from a shared inbox.
pub struct FakeChannel {
    open: Rc<Cell<bool>>,
    opens: Rc<Cell<u32>>,
    fail: Rc<Cell<bool>>,
    inbox: Rc<RefCell<VecDeque<Vec<u8>>>>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self {
            open: Rc::default(),
            opens: Rc::default(),
            fail: Rc::default(),
            inbox: Rc::default(),
        }
    }

    pub fn inbox(&self) -> Rc<RefCell<VecDeque<Vec<u8>>>> {
        Rc::clone(&self.inbox)
    }

    pub fn opens(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.opens)
    }

    pub fn open_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.open)
    }

    /// While set, `receive` fails.
    pub fn fail_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.fail)
    }
}

impl MessageChannel for FakeChannel {
    type Error = &'static str;

    fn open(&mut self, _endpoint: &EndpointAddress) -> Result<(), Self::Error> {
        self.opens.set(self.opens.get() + 1);
        self.open.set(true);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        if self.fail.get() {
            return Err("connection reset");
        }

        Ok(self.inbox.borrow_mut().pop_front().map(|frame| {
            let n = frame.len().min(buf.len());
            buf[..n].copy_from_slice(&frame[..n]);
            n
        }))
    }
}

/// HTTP client recording request targets and answering with a fixed status.
pub struct FakeHttp {
    requests: Rc<RefCell<Vec<String>>>,
    timeouts: Rc<RefCell<Vec<u32>>>,
    status: Rc<Cell<u16>>,
    fail: Rc<Cell<bool>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self {
            requests: Rc::default(),
            timeouts: Rc::default(),
            status: Rc::new(Cell::new(200)),
            fail: Rc::default(),
        }
    }

    pub fn requests(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.requests)
    }

    /// Timeout passed with each request.
    pub fn timeouts(&self) -> Rc<RefCell<Vec<u32>>> {
        Rc::clone(&self.timeouts)
    }

    pub fn status_handle(&self) -> Rc<Cell<u16>> {
        Rc::clone(&self.status)
    }

    /// While set, requests fail at the transport level.
    pub fn fail_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.fail)
    }
}

impl HttpClient for FakeHttp {
    type Error = &'static str;

    fn get(
        &mut self,
        _endpoint: &EndpointAddress,
        target: &str,
        timeout_ms: u32,
    ) -> Result<u16, Self::Error> {
        self.timeouts.borrow_mut().push(timeout_ms);
        if self.fail.get() {
            return Err("timed out");
        }
        self.requests.borrow_mut().push(String::from(target));
        Ok(self.status.get())
    }
}

/// Manually advanced millisecond counter.
#[derive(Clone)]
pub struct FakeClock {
    now: Rc<Cell<u32>>,
}

impl FakeClock {
    pub fn starting_at(now_ms: u32) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl TickSource for FakeClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
