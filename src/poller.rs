//! Drives a [`HeaterAccessory`]: one poll at startup, one per interval, and
//! setpoint changes as they arrive.
//!
//! Everything runs inside the one task, so a write and its follow-up poll can
//! never interleave with a scheduled poll.

use tokio::{
    sync::mpsc,
    time::{MissedTickBehavior, interval},
};
use tracing::{info, warn};

use crate::{accessory::HeaterAccessory, connection::Connector, types::SetpointKind};

/// A setpoint change requested by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointCommand {
    pub kind: SetpointKind,
    pub celsius: f64,
}

/// Run until every sender of `commands` has been dropped, then hand the
/// accessory back.
///
/// Failed polls and writes are logged and do not stop the loop.
pub async fn run<C: Connector>(
    mut accessory: HeaterAccessory<C>,
    mut commands: mpsc::Receiver<SetpointCommand>,
) -> HeaterAccessory<C> {
    let mut ticker = interval(accessory.config().poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        heater = %accessory.config().name,
        interval_secs = accessory.config().poll_interval,
        "Polling heater"
    );

    loop {
        tokio::select! {
            // The first tick completes immediately.
            _ = ticker.tick() => {
                if let Err(error) = accessory.refresh().await {
                    warn!(?error, "Heater poll failed");
                }
            }
            command = commands.recv() => match command {
                Some(SetpointCommand { kind, celsius }) => {
                    if let Err(error) = accessory.set_target(kind, celsius).await {
                        warn!(?kind, celsius, ?error, "Setting heater target failed");
                    }
                }
                None => break,
            },
        }
    }

    accessory
}
