//! This module contains the decoded heater data types.

use crate::{
    error::TransferError,
    register::{HoldingRegister, InputRegister, StatusWord},
    scaling::raw_to_celsius,
};

/// One decoded poll of the heater's input registers.
///
/// A fresh snapshot is built for every successful poll and replaces the
/// previous one as a whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceState {
    pub current_indoor_temperature: f64,
    pub target_indoor_temperature: f64,
    pub current_tuv_temperature: f64,
    pub target_tuv_temperature: f64,
    /// Raw status bitfield. See [`DeviceState::status_word`].
    pub status: u16,
    pub ambient_temperature: f64,
}

impl DeviceState {
    /// Decode the status word.
    pub fn status_word(&self) -> StatusWord {
        StatusWord::from(self.status)
    }

    /// Heating flags derived from the status word.
    pub fn activity(&self) -> HeatingActivity {
        HeatingActivity::from(self.status_word())
    }
}

impl TryFrom<&[u16]> for DeviceState {
    type Error = TransferError;

    /// Decode the polled input block, indexed from [`crate::register::INPUT_BLOCK_START`].
    fn try_from(block: &[u16]) -> Result<Self, Self::Error> {
        let word = |register: InputRegister| {
            block
                .get(register.block_index())
                .copied()
                .ok_or(TransferError::InvalidResponse)
        };
        let temperature = |register: InputRegister| word(register).map(raw_to_celsius);

        Ok(DeviceState {
            current_indoor_temperature: temperature(InputRegister::CurrentIndoorTemperature)?,
            target_indoor_temperature: temperature(InputRegister::TargetIndoorTemperature)?,
            current_tuv_temperature: temperature(InputRegister::CurrentTUVTemperature)?,
            target_tuv_temperature: temperature(InputRegister::TargetTUVTemperature)?,
            status: word(InputRegister::Status)?,
            ambient_temperature: temperature(InputRegister::AmbientTemperature)?,
        })
    }
}

/// What the heater is currently doing, as far as the status word tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeatingActivity {
    /// Space heating is active.
    ///
    /// The device only exposes a combined "running" bit, so this is also true
    /// while the burner is staging up for a hot water cycle that has not yet
    /// raised [`StatusWord::tuv_heating`].
    pub is_heating: bool,
    /// Domestic hot water is being heated.
    pub is_tuv_heating: bool,
}

impl From<StatusWord> for HeatingActivity {
    fn from(status: StatusWord) -> Self {
        let is_tuv_heating = status.tuv_heating();
        HeatingActivity {
            is_heating: status.running() && !is_tuv_heating,
            is_tuv_heating,
        }
    }
}

/// The two adjustable setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointKind {
    /// Space heating.
    Indoor,
    /// Domestic hot water.
    Tuv,
}

impl SetpointKind {
    pub const fn register(self) -> HoldingRegister {
        match self {
            SetpointKind::Indoor => HoldingRegister::TargetIndoorTemperature,
            SetpointKind::Tuv => HoldingRegister::TargetTUVTemperature,
        }
    }
}

impl From<SetpointKind> for HoldingRegister {
    fn from(value: SetpointKind) -> Self {
        value.register()
    }
}

/// Value announced to subscribers after each successful poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub state: DeviceState,
    pub activity: HeatingActivity,
}

impl From<DeviceState> for Reading {
    fn from(state: DeviceState) -> Self {
        Reading {
            activity: state.activity(),
            state,
        }
    }
}
