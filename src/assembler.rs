//! Silence-delimited RTU frame assembly
//!
//! RTU carries no length or terminator field: a frame is over when the line
//! has been quiet for at least 3.5 character times. Bytes are accumulated as
//! they arrive ([`FrameAssembler::on_byte`], byte-arrival context) and the
//! control loop detects the boundary by polling ([`FrameAssembler::poll`]).
//! The poll cadence must be finer than the inter-frame delay, otherwise
//! adjacent frames merge.
//!
//! `on_byte` is the single writer and `poll` the single reader; when the two
//! run in different execution contexts (UART interrupt vs main loop) the
//! assembler must sit behind a bounded critical section supplied by the
//! integrator.

use crate::consts::{FRAME_BUF_SIZE, MIN_FRAME_LEN};
use crate::{check_crc, ErrorKind, ModbusFrameBuf, VectorTrait};

/// A completed application data unit: address, function code, payload, CRC
///
/// Fixed 256-byte backing storage plus a fill length, so frames move around
/// without allocating. Also usable as a [`VectorTrait`] target for frame
/// builders.
#[derive(Clone, Copy)]
pub struct Adu {
    bytes: ModbusFrameBuf,
    len: usize,
}

impl Adu {
    pub fn new() -> Self {
        Self {
            bytes: [0; FRAME_BUF_SIZE],
            len: 0,
        }
    }

    /// Wrap an existing byte sequence
    ///
    /// Errors with **OOB** if the input exceeds the RTU frame size.
    pub fn from_slice(data: &[u8]) -> Result<Self, ErrorKind> {
        if data.len() > FRAME_BUF_SIZE {
            return Err(ErrorKind::OOB);
        }
        let mut adu = Self::new();
        adu.bytes[..data.len()].copy_from_slice(data);
        adu.len = data.len();
        Ok(adu)
    }

    /// True iff the frame is long enough to carry a trailer and the trailer
    /// matches the CRC of the preceding bytes
    pub fn crc_valid(&self) -> bool {
        self.len >= MIN_FRAME_LEN && check_crc(self.as_slice())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Adu {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Adu {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Adu({:02x?})", self.as_slice())
    }
}

impl VectorTrait<u8> for Adu {
    fn push(&mut self, value: u8) -> Result<(), ErrorKind> {
        if self.len >= FRAME_BUF_SIZE {
            return Err(ErrorKind::OOB);
        }
        self.bytes[self.len] = value;
        self.len += 1;
        Ok(())
    }
    fn extend(&mut self, values: &[u8]) -> Result<(), ErrorKind> {
        if self.len + values.len() > FRAME_BUF_SIZE {
            return Err(ErrorKind::OOB);
        }
        self.bytes[self.len..self.len + values.len()].copy_from_slice(values);
        self.len += values.len();
        Ok(())
    }
    #[inline]
    fn len(&self) -> usize {
        self.len
    }
    #[inline]
    fn is_empty(&self) -> bool {
        self.len == 0
    }
    #[inline]
    fn clear(&mut self) {
        self.len = 0;
    }
    fn cut_end(&mut self, len_to_cut: usize, _value: u8) {
        self.len = self.len.saturating_sub(len_to_cut);
    }
    #[inline]
    fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
    #[inline]
    fn replace(&mut self, index: usize, value: u8) {
        self.bytes[index] = value;
    }
}

/// Reassembles the asynchronous byte stream into discrete frames
pub struct FrameAssembler {
    buf: ModbusFrameBuf,
    len: usize,
    last_rx: u32,
    inter_frame_delay_ms: u32,
}

impl FrameAssembler {
    pub fn new(inter_frame_delay_ms: u32) -> Self {
        Self {
            buf: [0; FRAME_BUF_SIZE],
            len: 0,
            last_rx: 0,
            inter_frame_delay_ms,
        }
    }

    /// Record one received byte
    ///
    /// Beyond the 256-byte RTU capacity the byte is dropped but the arrival
    /// timestamp still refreshes: the silence timer keeps running and the
    /// oversized frame gets rejected by the CRC check downstream.
    pub fn on_byte(&mut self, byte: u8, now: u32) {
        if self.len < FRAME_BUF_SIZE {
            self.buf[self.len] = byte;
            self.len += 1;
        }
        self.last_rx = now;
    }

    /// Emit the accumulated frame once the line has been quiet long enough
    ///
    /// Re-arms reception for the next frame. Timestamps wrap (u32 ms ticks),
    /// so elapsed time is computed with wrapping arithmetic.
    pub fn poll(&mut self, now: u32) -> Option<Adu> {
        if self.len == 0 {
            return None;
        }
        if now.wrapping_sub(self.last_rx) < self.inter_frame_delay_ms {
            return None;
        }
        let mut adu = Adu::new();
        adu.bytes = self.buf;
        adu.len = self.len;
        self.len = 0;
        Some(adu)
    }

    /// Discard any partial accumulation
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// True while bytes of an unfinished frame are pending
    pub fn is_receiving(&self) -> bool {
        self.len > 0
    }
}
