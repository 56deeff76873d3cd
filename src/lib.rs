//! This crate bridges a Modbus/TCP heating appliance to a home-automation platform.
//!
//! The heater is presented as three entities:
//! * A space heating thermostat.
//! * A domestic hot water ("TUV") thermostat.
//! * An ambient (outdoor) temperature sensor.
//!
//! A [`Heater`] polls the device's input registers in one batch, decodes them
//! into a [`DeviceState`] and publishes a [`Reading`] to subscribers. Setpoints
//! are written back one holding register at a time.
//!
//! [`HeaterAccessory`] is what the platform adapter talks to, and
//! [`poller::run`] keeps it in sync on a fixed interval.
//!
//! The device is reached like so:
//! * Transport: Modbus/TCP, default port 502.
//! * Default unit ID: 1.
//! * Temperatures: signed 16-bit, tenths of a degree Celsius.
//!
//! Logging goes through `tracing`; install a subscriber in the host application
//! to see it.

pub mod accessory;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod heater;
pub mod poller;
pub mod register;
pub mod scaling;
pub mod types;

#[cfg(test)]
mod mock_transport;

pub use accessory::{HeaterAccessory, ThermostatView};
pub use config::{HeaterConfig, HeaterConfigBuilder};
pub use error::{Error, Result};
pub use heater::Heater;
pub use types::{DeviceState, HeatingActivity, Reading, SetpointKind};
