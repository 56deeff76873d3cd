//! The surface the home-automation platform talks to.
//!
//! One heater shows up as three entities: a space heating thermostat, a hot
//! water thermostat and an ambient temperature sensor. Getters answer from the
//! cached state. Setters clamp to the configured bounds, write, and then poll
//! straight away so the cache reflects the new setpoint.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    config::{ConfigError, HeaterConfig, TemperatureBounds},
    connection::{Connector, TcpConnector},
    error::{Error, Result},
    heater::Heater,
    types::{Reading, SetpointKind},
};

/// What a thermostat entity shows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThermostatView {
    /// `None` until the first successful poll.
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub heating: bool,
}

pub struct HeaterAccessory<C: Connector = TcpConnector> {
    config: HeaterConfig,
    heater: Heater<C>,
}

impl HeaterAccessory<TcpConnector> {
    /// Fails if `config` does not validate.
    pub fn new(config: HeaterConfig) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        let heater = Heater::from_config(&config);
        Ok(Self { config, heater })
    }
}

impl<C: Connector> HeaterAccessory<C> {
    /// Reach the heater through a custom connector instead of plain TCP.
    pub fn with_connector(
        config: HeaterConfig,
        connector: C,
    ) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        let heater = Heater::new(connector, config.unit_id, config.request_timeout());
        Ok(Self { config, heater })
    }

    pub fn config(&self) -> &HeaterConfig {
        &self.config
    }

    /// Display name of the ambient temperature sensor entity.
    pub fn sensor_name(&self) -> &str {
        &self.config.sensor_name
    }

    pub fn heater(&self) -> &Heater<C> {
        &self.heater
    }

    pub fn space_heating(&self) -> ThermostatView {
        ThermostatView {
            current_temperature: self.heater.state().map(|s| s.current_indoor_temperature),
            target_temperature: self.heater.state().map(|s| s.target_indoor_temperature),
            heating: self.heater.activity().is_heating,
        }
    }

    pub fn water_heating(&self) -> ThermostatView {
        ThermostatView {
            current_temperature: self.heater.state().map(|s| s.current_tuv_temperature),
            target_temperature: self.heater.state().map(|s| s.target_tuv_temperature),
            heating: self.heater.activity().is_tuv_heating,
        }
    }

    pub fn ambient_temperature(&self) -> Option<f64> {
        self.heater.state().map(|s| s.ambient_temperature)
    }

    pub fn is_offline(&self) -> bool {
        self.heater.is_offline()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Reading>> {
        self.heater.subscribe()
    }

    pub fn bounds(&self, kind: SetpointKind) -> TemperatureBounds {
        match kind {
            SetpointKind::Indoor => self.config.indoor_bounds(),
            SetpointKind::Tuv => self.config.tuv_bounds(),
        }
    }

    /// Poll the heater now.
    pub async fn refresh(&mut self) -> Result<()> {
        self.heater.synchronize().await
    }

    pub async fn set_space_heating_target(&mut self, celsius: f64) -> Result<f64> {
        self.set_target(SetpointKind::Indoor, celsius).await
    }

    pub async fn set_water_heating_target(&mut self, celsius: f64) -> Result<f64> {
        self.set_target(SetpointKind::Tuv, celsius).await
    }

    /// Clamp, write, then poll. Returns the setpoint actually written.
    ///
    /// An error means nothing was written. Once the write went through, a
    /// failed follow-up poll is only logged; the next scheduled poll catches up.
    /// The device may also take a moment to apply the change, so the poll right
    /// after can still show the old target.
    pub async fn set_target(&mut self, kind: SetpointKind, celsius: f64) -> Result<f64> {
        if !celsius.is_finite() {
            return Err(Error::InvalidSetpoint { kind, celsius });
        }
        let clamped = self.bounds(kind).clamp(celsius);
        if clamped != celsius {
            debug!(?kind, requested = celsius, clamped, "Setpoint clamped to configured bounds");
        }

        self.heater.set_target(kind, clamped).await?;
        if let Err(error) = self.heater.synchronize().await {
            warn!(?kind, clamped, ?error, "Setpoint written but follow-up poll failed");
        }
        Ok(clamped)
    }
}
