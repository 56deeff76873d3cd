use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::{
    config::HeaterConfig,
    connection::{ConnectionManager, Connector, TcpConnector},
    error::{Error, Result},
    register::{INPUT_BLOCK_LEN, INPUT_BLOCK_START},
    scaling::celsius_to_raw,
    types::{DeviceState, HeatingActivity, Reading, SetpointKind},
};

/// Keeps a cached copy of the heater's state in sync with the device.
///
/// For its methods, "synchronize" means to poll the device and refresh the
/// cache, where as "set" means to write a setpoint to the device. Reading the
/// cache never touches the network.
pub struct Heater<C: Connector = TcpConnector> {
    connection: ConnectionManager<C>,
    state: Option<DeviceState>,
    updates: watch::Sender<Option<Reading>>,
}

impl Heater<TcpConnector> {
    /// Create a heater reached over TCP as described by `config`.
    pub fn from_config(config: &HeaterConfig) -> Self {
        Self::new(
            TcpConnector::new(config.address()),
            config.unit_id,
            config.request_timeout(),
        )
    }
}

impl<C: Connector> Heater<C> {
    /// No connection is made until the first synchronize or set.
    pub fn new(connector: C, unit_id: u8, timeout: Option<Duration>) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            connection: ConnectionManager::new(connector, unit_id, timeout),
            state: None,
            updates,
        }
    }

    /// Last successfully polled state, if any poll has succeeded yet.
    pub fn state(&self) -> Option<DeviceState> {
        self.state
    }

    /// Heating flags of the last polled state. All clear before the first poll.
    pub fn activity(&self) -> HeatingActivity {
        self.state.map(|state| state.activity()).unwrap_or_default()
    }

    pub fn is_offline(&self) -> bool {
        self.connection.is_offline()
    }

    /// Receive a [`Reading`] after every successful poll.
    pub fn subscribe(&self) -> watch::Receiver<Option<Reading>> {
        self.updates.subscribe()
    }

    /// Poll the whole input block and publish the decoded state.
    ///
    /// On failure the cached state and the published reading are left as
    /// they were. Connection failures come back as [`Error::Connection`],
    /// anything after that as [`Error::Read`].
    pub async fn synchronize(&mut self) -> Result<()> {
        self.connection.clear_offline();

        let client = self.connection.acquire().await?;
        let decoded = client
            .read_input_registers(INPUT_BLOCK_START, INPUT_BLOCK_LEN)
            .await
            .and_then(|block| DeviceState::try_from(block.as_slice()));

        let state = match decoded {
            Ok(state) => state,
            Err(source) => {
                if source.breaks_connection() {
                    self.connection.close();
                }
                return Err(Error::Read(source));
            }
        };

        self.state = Some(state);
        let reading = Reading::from(state);
        debug!(
            address = self.connection.connector().address(),
            indoor = state.current_indoor_temperature,
            tuv = state.current_tuv_temperature,
            ambient = state.ambient_temperature,
            status = state.status,
            heating = reading.activity.is_heating,
            tuv_heating = reading.activity.is_tuv_heating,
            "Heater synchronized"
        );
        self.updates.send_replace(Some(reading));
        Ok(())
    }

    /// Write a setpoint in degrees Celsius.
    ///
    /// Bounds are not checked here, but NaN and infinities are refused. The
    /// cached state is not updated either; call [`Self::synchronize`]
    /// afterwards to pick up what the device accepted.
    pub async fn set_target(&mut self, kind: SetpointKind, celsius: f64) -> Result<()> {
        if !celsius.is_finite() {
            return Err(Error::InvalidSetpoint { kind, celsius });
        }
        let register = kind.register();
        let value = celsius_to_raw(celsius);

        let client = self.connection.acquire().await?;
        if let Err(source) = client.write_single_register(register, value).await {
            if source.breaks_connection() {
                self.connection.close();
            }
            return Err(Error::Write { register, source });
        }

        debug!(?register, value, celsius, "Setpoint written");
        Ok(())
    }
}
