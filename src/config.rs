//! Accessory configuration as handed over by the home-automation platform.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Modbus/TCP well-known port.
pub const DEFAULT_PORT: u16 = 502;
/// Default Modbus unit ID of the heater.
pub const DEFAULT_UNIT_ID: u8 = 0x01;
/// Seconds between two scheduled polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 20;
pub const DEFAULT_INDOOR_BOUNDS: TemperatureBounds = TemperatureBounds::new(10.0, 30.0);
pub const DEFAULT_TUV_BOUNDS: TemperatureBounds = TemperatureBounds::new(10.0, 55.0);

/// Use [`HeaterConfig::from_json`] or [`HeaterConfigBuilder`] to create a config.
///
/// Keys follow the platform's camelCase convention:
///
/// ```json
/// {
///     "name": "Boiler",
///     "sensorName": "Outside",
///     "ip": "192.168.1.40",
///     "pollInterval": 20,
///     "minTemperature": 10,
///     "maxTemperature": 30,
///     "minTuvTemperature": 10,
///     "maxTuvTemperature": 55
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaterConfig {
    /// Display name of the heater.
    pub name: String,
    /// Display name of the ambient temperature sensor.
    #[serde(default = "default_sensor_name")]
    pub sensor_name: String,
    /// Host name or IP address of the heater's Modbus/TCP interface.
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
    /// Seconds between scheduled polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    #[serde(default = "default_min_indoor")]
    pub min_temperature: f64,
    #[serde(default = "default_max_indoor")]
    pub max_temperature: f64,
    #[serde(default = "default_min_tuv")]
    pub min_tuv_temperature: f64,
    #[serde(default = "default_max_tuv")]
    pub max_tuv_temperature: f64,
    /// Seconds to wait for a connection or a response. Waits forever if unset.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

fn default_sensor_name() -> String {
    "Ambient Temperature".into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_unit_id() -> u8 {
    DEFAULT_UNIT_ID
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_min_indoor() -> f64 {
    DEFAULT_INDOOR_BOUNDS.min
}

fn default_max_indoor() -> f64 {
    DEFAULT_INDOOR_BOUNDS.max
}

fn default_min_tuv() -> f64 {
    DEFAULT_TUV_BOUNDS.min
}

fn default_max_tuv() -> f64 {
    DEFAULT_TUV_BOUNDS.max
}

impl HeaterConfig {
    /// Parse and validate a JSON accessory config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HeaterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ip.trim().is_empty() {
            return Err(ConfigError::MissingAddress);
        }
        if self.poll_interval == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        self.indoor_bounds().validate("indoor")?;
        self.tuv_bounds().validate("hot water")?;
        Ok(())
    }

    /// `host:port` of the heater.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_secs)
    }

    pub fn indoor_bounds(&self) -> TemperatureBounds {
        TemperatureBounds::new(self.min_temperature, self.max_temperature)
    }

    pub fn tuv_bounds(&self) -> TemperatureBounds {
        TemperatureBounds::new(self.min_tuv_temperature, self.max_tuv_temperature)
    }
}

/// Allowed setpoint range in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureBounds {
    pub min: f64,
    pub max: f64,
}

impl TemperatureBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Pull `celsius` into this range.
    ///
    /// Never panics, even on a range that failed validation. `max` wins when
    /// the two are crossed.
    pub fn clamp(&self, celsius: f64) -> f64 {
        celsius.max(self.min).min(self.max)
    }

    fn validate(&self, kind: &'static str) -> Result<(), ConfigError> {
        if self.min.is_finite() && self.max.is_finite() && self.min < self.max {
            Ok(())
        } else {
            Err(ConfigError::InvalidBounds {
                kind,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Use this type to create a [`HeaterConfig`] in code.
pub struct HeaterConfigBuilder {
    config: HeaterConfig,
}

impl HeaterConfigBuilder {
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> HeaterConfigBuilder {
        HeaterConfigBuilder {
            config: HeaterConfig {
                name: name.into(),
                sensor_name: default_sensor_name(),
                ip: ip.into(),
                port: DEFAULT_PORT,
                unit_id: DEFAULT_UNIT_ID,
                poll_interval: DEFAULT_POLL_INTERVAL_SECS,
                min_temperature: DEFAULT_INDOOR_BOUNDS.min,
                max_temperature: DEFAULT_INDOOR_BOUNDS.max,
                min_tuv_temperature: DEFAULT_TUV_BOUNDS.min,
                max_tuv_temperature: DEFAULT_TUV_BOUNDS.max,
                request_timeout: None,
            },
        }
    }

    /// Let's build it!
    pub fn build(self) -> Result<HeaterConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    pub fn with_sensor_name(mut self, sensor_name: impl Into<String>) -> Self {
        self.config.sensor_name = sensor_name.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.config.unit_id = unit_id;
        self
    }

    /// Set the polling interval in whole seconds.
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval = secs;
        self
    }

    /// Set the allowed space heating setpoint range.
    pub fn with_indoor_bounds(mut self, min: f64, max: f64) -> Self {
        self.config.min_temperature = min;
        self.config.max_temperature = max;
        self
    }

    /// Set the allowed hot water setpoint range.
    pub fn with_tuv_bounds(mut self, min: f64, max: f64) -> Self {
        self.config.min_tuv_temperature = min;
        self.config.max_tuv_temperature = max;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout = Some(secs);
        self
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Heater IP address not set")]
    MissingAddress,
    #[error("Polling interval must be at least one second")]
    ZeroPollInterval,
    #[error("Invalid {kind} temperature range {min}..{max}")]
    InvalidBounds {
        kind: &'static str,
        min: f64,
        max: f64,
    },
}
