//! Modbus/TCP request/response exchange over an async byte stream.
//!
//! Frames are generated and parsed by `rmodbus`; this module only moves them
//! across the wire and checks the MBAP header.

use std::{io, time::Duration};

use rmodbus::{ModbusProto, client::ModbusRequest};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransferError;

/// Transaction id, protocol id and length.
const MBAP_HEADER_LEN: usize = 6;
/// Largest Modbus/TCP application data unit.
const MAX_FRAME_LEN: usize = 260;
/// Room for any request this client generates.
const REQUEST_BUF_LEN: usize = 32;
/// Protocol limit for one register read.
pub const MAX_READ_REGISTERS: usize = 125;

pub type Registers = heapless::Vec<u16, MAX_READ_REGISTERS>;

/// A Modbus/TCP client bound to one open stream and one unit ID.
pub struct ModbusTcpClient<S> {
    stream: S,
    unit_id: u8,
    transaction_id: u16,
    timeout: Option<Duration>,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> ModbusTcpClient<S> {
    /// Wrap an open stream. `timeout` bounds each request/response exchange.
    pub fn new(stream: S, unit_id: u8, timeout: Option<Duration>) -> Self {
        Self {
            stream,
            unit_id,
            transaction_id: 0,
            timeout,
        }
    }

    /// Read `count` contiguous input registers (function 0x04).
    pub async fn read_input_registers(
        &mut self,
        start_register: impl Into<u16>,
        count: u16,
    ) -> Result<Registers, TransferError> {
        if count as usize > MAX_READ_REGISTERS {
            return Err(TransferError::BufferError);
        }
        let mut req = self.next_request();
        let mut buff: heapless::Vec<u8, REQUEST_BUF_LEN> = heapless::Vec::new();
        req.generate_get_inputs(start_register.into(), count, &mut buff)?;

        let mut frame = [0u8; MAX_FRAME_LEN];
        let len = self.exchange(&buff, req.tr_id, &mut frame).await?;

        let mut values = Registers::new();
        req.parse_u16(&frame[..len], &mut values)?;
        if values.len() != count as usize {
            return Err(TransferError::InvalidResponse);
        }
        Ok(values)
    }

    /// Write a single holding register (function 0x06).
    ///
    /// The device must echo the request back unchanged.
    pub async fn write_single_register(
        &mut self,
        register: impl Into<u16>,
        value: u16,
    ) -> Result<(), TransferError> {
        let mut req = self.next_request();
        let mut buff: heapless::Vec<u8, REQUEST_BUF_LEN> = heapless::Vec::new();
        req.generate_set_holding(register.into(), value, &mut buff)?;

        let mut frame = [0u8; MAX_FRAME_LEN];
        let len = self.exchange(&buff, req.tr_id, &mut frame).await?;

        // Exceptions first, so they surface as Modbus errors rather than a bad echo.
        req.parse_ok(&frame[..len])?;
        if buff.as_slice() != &frame[..len] {
            return Err(TransferError::InvalidResponse);
        }
        Ok(())
    }

    fn next_request(&mut self) -> ModbusRequest {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        let mut req = ModbusRequest::new(self.unit_id, ModbusProto::TcpUdp);
        req.tr_id = self.transaction_id;
        req
    }

    async fn exchange(
        &mut self,
        request: &[u8],
        tr_id: u16,
        frame: &mut [u8; MAX_FRAME_LEN],
    ) -> Result<usize, TransferError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.transact(request, tr_id, frame))
                .await
                .map_err(|_| TransferError::Io(io::ErrorKind::TimedOut.into()))?,
            None => self.transact(request, tr_id, frame).await,
        }
    }

    /// Send one request and read back exactly one response frame.
    async fn transact(
        &mut self,
        request: &[u8],
        tr_id: u16,
        frame: &mut [u8; MAX_FRAME_LEN],
    ) -> Result<usize, TransferError> {
        self.stream.write_all(request).await?;
        self.stream.flush().await?;

        self.stream.read_exact(&mut frame[..MBAP_HEADER_LEN]).await?;
        let response_tr_id = u16::from_be_bytes([frame[0], frame[1]]);
        let protocol_id = u16::from_be_bytes([frame[2], frame[3]]);
        let body_len = u16::from_be_bytes([frame[4], frame[5]]) as usize;

        // Unit id + function code at the very least.
        if body_len < 2 || MBAP_HEADER_LEN + body_len > MAX_FRAME_LEN {
            return Err(TransferError::InvalidResponse);
        }
        let frame_len = MBAP_HEADER_LEN + body_len;
        self.stream
            .read_exact(&mut frame[MBAP_HEADER_LEN..frame_len])
            .await?;

        if response_tr_id != tr_id || protocol_id != 0 {
            return Err(TransferError::InvalidResponse);
        }
        Ok(frame_len)
    }
}
