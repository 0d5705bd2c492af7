//! Hardware-independent core library for station-node
//!
//! This crate contains the device-side telemetry and command pipeline for a
//! small WiFi sensor node: the reconnecting network session, the sensor
//! abstraction, the telemetry request encoder, the binary command decoder and
//! the cooperative scheduling loop that ties them together.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests). Radios,
//! buses, pins and clocks are consumed through traits.

#![no_std]

extern crate alloc;

pub mod actuator;
pub mod app_state;
pub mod clock;
pub mod command;
pub mod config;
pub mod network;
pub mod scheduler;
pub mod sensors;
pub mod telemetry;

#[cfg(test)]
mod testing;
