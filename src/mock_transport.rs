//! We use this mocking module in unit tests to emulate the heater on the far end of a TCP link.

use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

use crate::{
    connection::Connector,
    register::{INPUT_BLOCK_LEN, InputRegister},
};

/// How the emulated device answers a register read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFault {
    #[default]
    None,
    /// Answer with a "server device failure" exception.
    Exception,
    /// Close the connection without answering.
    HangUp,
}

/// Register contents and request log of the emulated device.
#[derive(Debug, Default)]
struct MockDevice {
    inputs: [u16; INPUT_BLOCK_LEN as usize],
    writes: Vec<(u16, u16)>,
    reads: usize,
    read_fault: ReadFault,
}

impl MockDevice {
    /// Build the response to one request, or `None` to hang up.
    ///
    /// `header` is the MBAP header followed by the unit ID.
    fn handle(&mut self, header: &[u8; 7], pdu: &[u8]) -> Option<Vec<u8>> {
        let function = *pdu.first()?;
        let word = |at: usize| u16::from_be_bytes([pdu[at], pdu[at + 1]]);

        let body = match function {
            0x04 if pdu.len() == 5 => {
                self.reads += 1;
                match self.read_fault {
                    ReadFault::HangUp => return None,
                    ReadFault::Exception => vec![0x84, 0x04],
                    ReadFault::None => {
                        let (start, count) = (word(1) as usize, word(3) as usize);
                        let mut body = vec![0x04, (count * 2) as u8];
                        for address in start..start + count {
                            let value = self.inputs.get(address).copied().unwrap_or_default();
                            body.extend_from_slice(&value.to_be_bytes());
                        }
                        body
                    }
                }
            }
            0x06 if pdu.len() == 5 => {
                let (register, value) = (word(1), word(3));
                self.writes.push((register, value));
                // The heater reports accepted setpoints at the same input address.
                if let Some(slot) = self.inputs.get_mut(register as usize) {
                    *slot = value;
                }
                pdu.to_vec()
            }
            other => vec![other | 0x80, 0x01],
        };

        let mut frame = Vec::with_capacity(7 + body.len());
        frame.extend_from_slice(&header[0..4]);
        frame.extend_from_slice(&((body.len() + 1) as u16).to_be_bytes());
        frame.push(header[6]);
        frame.extend_from_slice(&body);
        Some(frame)
    }
}

/// Connector handing out in-memory streams served by one shared [`MockDevice`].
///
/// Clones share the device, so a test can keep one and give another away.
#[derive(Clone, Default)]
pub struct MockConnector {
    device: Arc<Mutex<MockDevice>>,
    dials: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
    stall: Arc<AtomicBool>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times [`Connector::connect`] was called.
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Number of register reads the device has seen.
    pub fn read_count(&self) -> usize {
        self.device().reads
    }

    /// Register writes the device has seen, in order.
    pub fn writes(&self) -> Vec<(u16, u16)> {
        self.device().writes.clone()
    }

    /// Make the next dials fail with "connection refused".
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Make the next dials never complete.
    pub fn set_stall(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    pub fn set_read_fault(&self, fault: ReadFault) {
        self.device().read_fault = fault;
    }

    pub fn set_input(&self, register: InputRegister, raw: u16) {
        self.device().inputs[register.block_index()] = raw;
    }

    fn device(&self) -> std::sync::MutexGuard<'_, MockDevice> {
        self.device.lock().unwrap()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Stream = DuplexStream;

    async fn connect(&self) -> io::Result<DuplexStream> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.refuse.load(Ordering::SeqCst) {
            return Err(io::ErrorKind::ConnectionRefused.into());
        }

        let (client, server) = duplex(1024);
        tokio::spawn(serve(server, self.device.clone()));
        Ok(client)
    }

    fn address(&self) -> &str {
        "mock-heater:502"
    }
}

/// Answer requests until the client goes away or the device hangs up.
async fn serve(mut stream: DuplexStream, device: Arc<Mutex<MockDevice>>) {
    loop {
        let mut header = [0u8; 7];
        if stream.read_exact(&mut header).await.is_err() {
            return;
        }
        let len = u16::from_be_bytes([header[4], header[5]]) as usize;
        let mut pdu = vec![0u8; len.saturating_sub(1)];
        if stream.read_exact(&mut pdu).await.is_err() {
            return;
        }

        let response = device.lock().unwrap().handle(&header, &pdu);
        match response {
            Some(frame) => {
                if stream.write_all(&frame).await.is_err() {
                    return;
                }
            }
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ModbusTcpClient;

    #[tokio::test]
    async fn test_serves_input_block() {
        let connector = MockConnector::new();
        connector.set_input(InputRegister::CurrentIndoorTemperature, 215);
        let stream = connector.connect().await.unwrap();
        let mut client = ModbusTcpClient::new(stream, 0x01, None);

        let block = client.read_input_registers(0x00u16, INPUT_BLOCK_LEN).await.unwrap();
        assert_eq!(block.len(), INPUT_BLOCK_LEN as usize);
        assert_eq!(block[InputRegister::CurrentIndoorTemperature.block_index()], 215);
        assert_eq!(connector.read_count(), 1);
    }

    #[tokio::test]
    async fn test_records_writes() {
        let connector = MockConnector::new();
        let stream = connector.connect().await.unwrap();
        let mut client = ModbusTcpClient::new(stream, 0x01, None);

        client.write_single_register(0x0Au16, 500).await.unwrap();
        assert_eq!(connector.writes(), vec![(0x0A, 500)]);

        let block = client.read_input_registers(0x00u16, INPUT_BLOCK_LEN).await.unwrap();
        assert_eq!(block[InputRegister::TargetTUVTemperature.block_index()], 500);
    }

    #[tokio::test]
    async fn test_refuse_and_count_dials() {
        let connector = MockConnector::new();
        connector.set_refuse(true);
        assert!(connector.connect().await.is_err());
        connector.set_refuse(false);
        assert!(connector.connect().await.is_ok());
        assert_eq!(connector.dial_count(), 2);
    }

    #[tokio::test]
    async fn test_hang_up() {
        let connector = MockConnector::new();
        connector.set_read_fault(ReadFault::HangUp);
        let stream = connector.connect().await.unwrap();
        let mut client = ModbusTcpClient::new(stream, 0x01, None);

        let err = client.read_input_registers(0x00u16, INPUT_BLOCK_LEN).await.unwrap_err();
        assert!(err.breaks_connection());
    }
}
