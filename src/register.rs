//! This module is used to define the registers on the heater.
//!
//! All temperatures are signed 16-bit values in tenths of a degree Celsius,
//! e.g. 21.5°C => `215`. See [`scaling`](crate::scaling).

use modular_bitfield::prelude::*;
use strum_macros::EnumIter;

/// Address of the first register of the polled input block.
pub const INPUT_BLOCK_START: u16 = 0x00;

/// Number of input registers fetched by a single poll.
///
/// Every [`InputRegister`] lies inside `INPUT_BLOCK_START..INPUT_BLOCK_START + INPUT_BLOCK_LEN`.
pub const INPUT_BLOCK_LEN: u16 = 24;

/// Writable setpoint registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum HoldingRegister {
    /// __W__ - Space heating setpoint.
    TargetIndoorTemperature = 0x04,
    /// __W__ - Domestic hot water setpoint.
    TargetTUVTemperature = 0x0A,
}

impl From<HoldingRegister> for u16 {
    fn from(value: HoldingRegister) -> Self {
        value as u16
    }
}

/// Read-only registers polled in one batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum InputRegister {
    /// __R__ - Status bitfield. See [`StatusWord`].
    Status = 0x00,
    /// __R__ - Measured indoor temperature.
    CurrentIndoorTemperature = 0x03,
    /// __R__ - Space heating setpoint as accepted by the device.
    TargetIndoorTemperature = 0x04,
    /// __R__ - Measured hot water temperature.
    CurrentTUVTemperature = 0x09,
    /// __R__ - Hot water setpoint as accepted by the device.
    TargetTUVTemperature = 0x0A,
    /// __R__ - Outdoor air temperature.
    AmbientTemperature = 0x17,
}

impl InputRegister {
    /// Position of this register inside the polled block.
    pub const fn block_index(self) -> usize {
        (self as u16 - INPUT_BLOCK_START) as usize
    }
}

impl From<InputRegister> for u16 {
    fn from(value: InputRegister) -> Self {
        value as u16
    }
}

/// Bit positions inside the [`InputRegister::Status`] word.
///
/// Bits 4 - 15 are reserved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum StatusBit {
    /// 0: Appliance switched on.
    On = 0,
    /// 1: Burner / compressor running. Set for both space and water heating.
    Running = 1,
    /// 2: Appliance reports a fault.
    Failure = 2,
    /// 3: Running cycle is heating domestic hot water.
    TUVHeating = 3,
}

impl StatusBit {
    pub const fn mask(self) -> u16 {
        1 << self as u16
    }
}

/// The status word split into its named flags.
///
/// Decode with `StatusWord::from(raw)` straight after a read; nothing past this
/// point should mask raw bits.
#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWord {
    pub on: bool,
    pub running: bool,
    pub failure: bool,
    pub tuv_heating: bool,
    #[skip]
    __: B12,
}

impl StatusWord {
    /// Whether the given bit is set.
    pub fn is_set(&self, bit: StatusBit) -> bool {
        match bit {
            StatusBit::On => self.on(),
            StatusBit::Running => self.running(),
            StatusBit::Failure => self.failure(),
            StatusBit::TUVHeating => self.tuv_heating(),
        }
    }
}

impl From<u16> for StatusWord {
    fn from(raw: u16) -> Self {
        StatusWord::from_bytes(raw.to_le_bytes())
    }
}
