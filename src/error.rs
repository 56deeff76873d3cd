//! Our error types for the heater bridge.

use thiserror::Error;

use crate::{config::ConfigError, register::HoldingRegister, types::SetpointKind};

pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by the heater operations.
///
/// Every variant is terminal for the call that produced it. Nothing in this
/// crate retries on its own.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not connect to heater at {address}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Reading input registers failed")]
    Read(#[source] TransferError),
    #[error("Writing register {register:?} failed")]
    Write {
        register: HoldingRegister,
        #[source]
        source: TransferError,
    },
    #[error("Refusing to set {kind:?} target to {celsius}")]
    InvalidSetpoint { kind: SetpointKind, celsius: f64 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure of a single request/response exchange on an open connection.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Communication error")]
    Io(#[from] std::io::Error),
    #[error("Modbus protocol error: {0}")]
    Modbus(rmodbus::ErrorKind),
    #[error("Frame buffer too small")]
    BufferError,
    #[error("Invalid response received")]
    InvalidResponse,
}

impl From<rmodbus::ErrorKind> for TransferError {
    fn from(err: rmodbus::ErrorKind) -> Self {
        TransferError::Modbus(err)
    }
}

impl TransferError {
    /// Whether the byte stream can no longer be trusted after this error.
    ///
    /// A Modbus exception is a well-formed answer from the device, so the
    /// connection stays usable. Anything else may leave unread or foreign bytes
    /// in the stream.
    pub fn breaks_connection(&self) -> bool {
        !matches!(self, TransferError::Modbus(_))
    }
}
