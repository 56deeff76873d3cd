//! Connection lifecycle to the heater.
//!
//! A [`ConnectionManager`] owns at most one open client. It dials lazily on the
//! first request, hands the same client to every later read and write, and
//! tracks whether the heater is reachable.

use std::{io, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tracing::{debug, info, warn};

use crate::{
    client::ModbusTcpClient,
    error::{Error, Result},
};

/// Opens byte streams to the heater.
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    async fn connect(&self) -> io::Result<Self::Stream>;

    /// `host:port` used for logs and errors.
    fn address(&self) -> &str;
}

/// Plain TCP connector, the normal way of reaching the heater.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(&self.address).await?;
        stream.set_nodelay(true).ok();
        Ok(stream)
    }

    fn address(&self) -> &str {
        &self.address
    }
}

pub struct ConnectionManager<C: Connector> {
    connector: C,
    unit_id: u8,
    timeout: Option<Duration>,
    client: Option<ModbusTcpClient<C::Stream>>,
    /// Last connection attempt failed.
    offline: bool,
    /// An offline episode has been logged and not yet closed by a successful connect.
    offline_reported: bool,
}

impl<C: Connector> ConnectionManager<C> {
    /// `timeout` bounds connecting as well as each later request.
    pub fn new(connector: C, unit_id: u8, timeout: Option<Duration>) -> Self {
        Self {
            connector,
            unit_id,
            timeout,
            client: None,
            offline: false,
            offline_reported: false,
        }
    }

    /// Return the open client, dialing first if there is none.
    ///
    /// A failed dial is returned as [`Error::Connection`] and is not retried.
    pub async fn acquire(&mut self) -> Result<&mut ModbusTcpClient<C::Stream>> {
        let client = match self.client.take() {
            Some(client) => client,
            None => self.dial().await?,
        };
        Ok(self.client.insert(client))
    }

    /// Drop the open client, if any. The next [`Self::acquire`] dials again.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            debug!(address = self.connector.address(), "Closed heater connection");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Assume the heater is reachable again until the next dial says otherwise.
    pub fn clear_offline(&mut self) {
        self.offline = false;
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    async fn dial(&mut self) -> Result<ModbusTcpClient<C::Stream>> {
        let connecting = self.connector.connect();
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, connecting)
                .await
                .unwrap_or_else(|_| Err(io::ErrorKind::TimedOut.into())),
            None => connecting.await,
        };

        match result {
            Ok(stream) => {
                self.mark_online();
                info!(
                    address = self.connector.address(),
                    unit_id = self.unit_id,
                    "Connected to heater"
                );
                Ok(ModbusTcpClient::new(stream, self.unit_id, self.timeout))
            }
            Err(source) => {
                self.mark_offline(&source);
                Err(Error::Connection {
                    address: self.connector.address().to_owned(),
                    source,
                })
            }
        }
    }

    fn mark_online(&mut self) {
        self.offline = false;
        if self.offline_reported {
            self.offline_reported = false;
            info!(address = self.connector.address(), "Heater back online");
        }
    }

    /// Warns once per offline episode, however many dials fail in a row.
    fn mark_offline(&mut self, error: &io::Error) {
        self.offline = true;
        if self.offline_reported {
            debug!(address = self.connector.address(), %error, "Heater still offline");
        } else {
            self.offline_reported = true;
            warn!(address = self.connector.address(), %error, "Heater went offline");
        }
    }
}
