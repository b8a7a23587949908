//! Slave role: frame dispatch against a register map
//!
//! [`ModbusFrame`] is the per-frame dispatcher: it decodes one CRC-checked
//! request, runs it against a [`context::ModbusContext`] and leaves the
//! response (data or exception) in the caller's buffer. [`Slave`] wires the
//! dispatcher to a serial link: assembler in, dispatcher, direction-
//! controlled transmit out.
//!
//! Per protocol rules a slave stays silent on anything it cannot even
//! attribute: short frames and CRC failures are dropped without a response,
//! and broadcast frames are executed but never answered.

pub mod context;
pub mod storage;

use crate::assembler::{Adu, FrameAssembler};
use crate::codec;
use crate::config::LinkConfig;
use crate::consts::{
    BROADCAST_UNIT_ID, MAX_READ_BITS, MAX_READ_REGISTERS, MAX_WRITE_BITS, MAX_WRITE_REGISTERS,
    MIN_FRAME_LEN, MODBUS_ERROR_ILLEGAL_DATA_ADDRESS, MODBUS_ERROR_ILLEGAL_DATA_VALUE,
    MODBUS_ERROR_ILLEGAL_FUNCTION, MODBUS_GET_COILS, MODBUS_GET_DISCRETES, MODBUS_GET_HOLDINGS,
    MODBUS_GET_INPUTS, MODBUS_SET_COIL, MODBUS_SET_COILS_BULK, MODBUS_SET_HOLDING,
    MODBUS_SET_HOLDINGS_BULK, COIL_OFF, COIL_ON,
};
use crate::transport::{send_frame, Clock, DirectionPin, SerialLine};
use crate::{calc_crc16, check_crc, ErrorKind, VectorTrait};
use context::ModbusContext;

/// One incoming frame being dispatched
///
/// ```rust
/// use rtulink::server::{storage::ModbusStorageSmall, ModbusFrame};
///
/// let mut ctx = ModbusStorageSmall::new();
/// let unit_id = 1;
/// // read holding 0, count 1
/// let request = [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A];
/// let mut response: Vec<u8> = Vec::new();
/// let mut frame = ModbusFrame::new(unit_id, &request, &mut response);
/// if frame.parse().is_ok() {
///     if frame.processing_required {
///         let result = if frame.readonly {
///             frame.process_read(&ctx)
///         } else {
///             frame.process_write(&mut ctx)
///         };
///         assert!(result.is_ok());
///     }
///     if frame.response_required {
///         frame.finalize_response().unwrap();
///         // send response somewhere
///     }
/// }
/// ```
pub struct ModbusFrame<'a, V: VectorTrait<u8>> {
    pub unit_id: u8,
    buf: &'a [u8],
    pub response: &'a mut V,
    /// after parse: is processing required
    pub processing_required: bool,
    /// is a response required (never for broadcast)
    pub response_required: bool,
    /// is the request read-only
    pub readonly: bool,
    /// function requested
    pub func: u8,
    /// starting register
    pub reg: u16,
    /// registers/bits to process
    pub count: u16,
    /// Modbus exception to answer with, 0 if none
    pub error: u8,
    broadcast: bool,
}

impl<'a, V: VectorTrait<u8>> ModbusFrame<'a, V> {
    pub fn new(unit_id: u8, buf: &'a [u8], response: &'a mut V) -> Self {
        response.clear();
        Self {
            unit_id,
            buf,
            response,
            processing_required: false,
            response_required: false,
            readonly: true,
            func: 0,
            reg: 0,
            count: 1,
            error: 0,
            broadcast: false,
        }
    }

    /// Decode the frame header and validate its integrity
    ///
    /// Err means the frame must be dropped silently (malformed or bad CRC).
    /// Ok with nothing required means the frame was for somebody else.
    #[allow(clippy::too_many_lines)]
    pub fn parse(&mut self) -> Result<(), ErrorKind> {
        if self.buf.len() < MIN_FRAME_LEN {
            return Err(ErrorKind::FrameBroken);
        }
        let unit = self.buf[0];
        self.broadcast = unit == BROADCAST_UNIT_ID;
        if !self.broadcast && unit != self.unit_id {
            return Ok(());
        }
        if !check_crc(self.buf) {
            return Err(ErrorKind::FrameCRCError);
        }
        self.func = self.buf[1];
        match self.func {
            MODBUS_GET_COILS | MODBUS_GET_DISCRETES | MODBUS_GET_HOLDINGS | MODBUS_GET_INPUTS => {
                // reads of a broadcast frame have nobody to answer to
                if self.broadcast {
                    return Ok(());
                }
                if self.buf.len() != 8 {
                    return Err(ErrorKind::FrameBroken);
                }
                self.response_required = true;
                self.reg = codec::from_wire16(self.buf[2], self.buf[3]);
                self.count = codec::from_wire16(self.buf[4], self.buf[5]);
                let limit = match self.func {
                    MODBUS_GET_COILS | MODBUS_GET_DISCRETES => MAX_READ_BITS,
                    _ => MAX_READ_REGISTERS,
                };
                if self.count == 0 || self.count > limit {
                    self.error = MODBUS_ERROR_ILLEGAL_DATA_VALUE;
                    return Ok(());
                }
                self.processing_required = true;
                Ok(())
            }
            MODBUS_SET_COIL | MODBUS_SET_HOLDING => {
                if self.buf.len() != 8 {
                    return Err(ErrorKind::FrameBroken);
                }
                if !self.broadcast {
                    self.response_required = true;
                }
                self.processing_required = true;
                self.readonly = false;
                self.reg = codec::from_wire16(self.buf[2], self.buf[3]);
                Ok(())
            }
            MODBUS_SET_COILS_BULK | MODBUS_SET_HOLDINGS_BULK => {
                if self.buf.len() < 10 {
                    return Err(ErrorKind::FrameBroken);
                }
                let bytes = self.buf[6];
                if self.buf.len() != 9 + usize::from(bytes) {
                    return Err(ErrorKind::FrameBroken);
                }
                if !self.broadcast {
                    self.response_required = true;
                }
                self.readonly = false;
                self.reg = codec::from_wire16(self.buf[2], self.buf[3]);
                self.count = codec::from_wire16(self.buf[4], self.buf[5]);
                let (limit, expected_bytes) = if self.func == MODBUS_SET_COILS_BULK {
                    (MAX_WRITE_BITS, u32::from(codec::bit_len_to_bytes(self.count)))
                } else {
                    (MAX_WRITE_REGISTERS, u32::from(self.count) * 2)
                };
                if self.count == 0 || self.count > limit || u32::from(bytes) != expected_bytes {
                    self.error = MODBUS_ERROR_ILLEGAL_DATA_VALUE;
                    return Ok(());
                }
                self.processing_required = true;
                Ok(())
            }
            _ => {
                // function unsupported
                if !self.broadcast {
                    self.response_required = true;
                    self.error = MODBUS_ERROR_ILLEGAL_FUNCTION;
                }
                Ok(())
            }
        }
    }

    /// Process read functions
    pub fn process_read<M: ModbusContext>(&mut self, ctx: &M) -> Result<(), ErrorKind> {
        match self.func {
            MODBUS_GET_COILS | MODBUS_GET_DISCRETES => {
                let in_range = if self.func == MODBUS_GET_COILS {
                    ctx.check_coil_range(self.reg, self.count)
                } else {
                    ctx.check_discrete_range(self.reg, self.count)
                };
                if in_range.is_err() {
                    self.error = MODBUS_ERROR_ILLEGAL_DATA_ADDRESS;
                    return Ok(());
                }
                let data_len = codec::bit_len_to_bytes(self.count);
                self.response.extend(&[self.unit_id, self.func])?;
                #[allow(clippy::cast_possible_truncation)]
                self.response.push(data_len as u8)?;
                let result = if self.func == MODBUS_GET_COILS {
                    ctx.get_coils_as_u8(self.reg, self.count, self.response)
                } else {
                    ctx.get_discretes_as_u8(self.reg, self.count, self.response)
                };
                self.map_context_result(result)
            }
            MODBUS_GET_HOLDINGS | MODBUS_GET_INPUTS => {
                let in_range = if self.func == MODBUS_GET_HOLDINGS {
                    ctx.check_holding_range(self.reg, self.count)
                } else {
                    ctx.check_input_range(self.reg, self.count)
                };
                if in_range.is_err() {
                    self.error = MODBUS_ERROR_ILLEGAL_DATA_ADDRESS;
                    return Ok(());
                }
                let data_len = self.count * 2;
                self.response.extend(&[self.unit_id, self.func])?;
                #[allow(clippy::cast_possible_truncation)]
                self.response.push(data_len as u8)?;
                let result = if self.func == MODBUS_GET_HOLDINGS {
                    ctx.get_holdings_as_u8(self.reg, self.count, self.response)
                } else {
                    ctx.get_inputs_as_u8(self.reg, self.count, self.response)
                };
                self.map_context_result(result)
            }
            _ => Ok(()),
        }
    }

    /// Process write functions
    ///
    /// The address window is validated before anything is stored, so a
    /// rejected request never leaves the map partially written.
    pub fn process_write<M: ModbusContext>(&mut self, ctx: &mut M) -> Result<(), ErrorKind> {
        match self.func {
            MODBUS_SET_COIL => {
                let value = match codec::from_wire16(self.buf[4], self.buf[5]) {
                    COIL_ON => true,
                    COIL_OFF => false,
                    _ => {
                        self.error = MODBUS_ERROR_ILLEGAL_DATA_VALUE;
                        return Ok(());
                    }
                };
                if ctx.set_coil(self.reg, value).is_err() {
                    self.error = MODBUS_ERROR_ILLEGAL_DATA_ADDRESS;
                    return Ok(());
                }
                // 6b echo: unit, func, reg, val
                self.response.extend(&self.buf[0..6])
            }
            MODBUS_SET_HOLDING => {
                let value = codec::from_wire16(self.buf[4], self.buf[5]);
                if ctx.set_holding(self.reg, value).is_err() {
                    self.error = MODBUS_ERROR_ILLEGAL_DATA_ADDRESS;
                    return Ok(());
                }
                // 6b echo: unit, func, reg, val
                self.response.extend(&self.buf[0..6])
            }
            MODBUS_SET_COILS_BULK | MODBUS_SET_HOLDINGS_BULK => {
                let bytes = usize::from(self.buf[6]);
                let data = &self.buf[7..7 + bytes];
                if self.func == MODBUS_SET_COILS_BULK {
                    if ctx.check_coil_range(self.reg, self.count).is_err() {
                        self.error = MODBUS_ERROR_ILLEGAL_DATA_ADDRESS;
                        return Ok(());
                    }
                    ctx.set_coils_from_u8(self.reg, self.count, data)?;
                } else {
                    if ctx.check_holding_range(self.reg, self.count).is_err() {
                        self.error = MODBUS_ERROR_ILLEGAL_DATA_ADDRESS;
                        return Ok(());
                    }
                    ctx.set_holdings_from_u8(self.reg, data)?;
                }
                // 6b echo: unit, func, reg, count
                self.response.extend(&self.buf[0..6])
            }
            _ => Ok(()),
        }
    }

    /// Should always be called before the response is sent
    ///
    /// Writes the exception body if an error was flagged, then appends the
    /// CRC trailer.
    pub fn finalize_response(&mut self) -> Result<(), ErrorKind> {
        if self.error > 0 {
            self.response.clear();
            self.response
                .extend(&[self.unit_id, self.func | 0x80, self.error])?;
        }
        let len = self.response.len();
        if len > usize::from(u8::MAX) {
            return Err(ErrorKind::OOB);
        }
        #[allow(clippy::cast_possible_truncation)]
        let crc = calc_crc16(self.response.as_slice(), len as u8);
        self.response.extend(&crc.to_le_bytes())
    }

    fn map_context_result(&mut self, result: Result<(), ErrorKind>) -> Result<(), ErrorKind> {
        match result {
            Ok(()) => Ok(()),
            Err(ErrorKind::OOBContext) => {
                self.response.clear();
                self.error = MODBUS_ERROR_ILLEGAL_DATA_ADDRESS;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// A slave endpoint bound to one serial link
///
/// Owns the register map it serves. Feed it bytes ([`Slave::on_byte`] or
/// the port's own receive buffer) and call [`Slave::poll`] from the control
/// loop at a cadence finer than the inter-frame delay.
pub struct Slave<S: SerialLine, D: DirectionPin, C: Clock, M: ModbusContext> {
    port: S,
    dir: D,
    clock: C,
    assembler: FrameAssembler,
    config: LinkConfig,
    context: M,
}

impl<S: SerialLine, D: DirectionPin, C: Clock, M: ModbusContext> Slave<S, D, C, M> {
    pub fn new(port: S, dir: D, clock: C, config: LinkConfig, context: M) -> Result<Self, ErrorKind> {
        config.validate()?;
        Ok(Self::from_parts(port, dir, clock, config, context))
    }

    pub(crate) fn from_parts(port: S, dir: D, clock: C, mut config: LinkConfig, context: M) -> Self {
        config.role = crate::config::Role::Slave;
        Self {
            port,
            dir,
            clock,
            assembler: FrameAssembler::new(config.inter_frame_delay_ms),
            config,
            context,
        }
    }

    /// Record one received byte (byte-arrival context)
    pub fn on_byte(&mut self, byte: u8) {
        let now = self.clock.now_ms();
        self.assembler.on_byte(byte, now);
    }

    /// Drain the port, check for a completed frame and dispatch it
    ///
    /// Returns Ok(true) when a frame was consumed (whether or not it
    /// produced a response). Malformed and CRC-invalid frames are consumed
    /// silently.
    pub fn poll(&mut self) -> Result<bool, ErrorKind> {
        let now = self.clock.now_ms();
        while let Some(byte) = self.port.read_byte()? {
            self.assembler.on_byte(byte, now);
        }
        let Some(adu) = self.assembler.poll(now) else {
            return Ok(false);
        };
        let mut response = Adu::new();
        let respond = {
            let mut frame = ModbusFrame::new(self.config.unit_id, adu.as_slice(), &mut response);
            if frame.parse().is_err() {
                return Ok(true);
            }
            if frame.processing_required {
                let result = if frame.readonly {
                    frame.process_read(&self.context)
                } else {
                    frame.process_write(&mut self.context)
                };
                result?;
            }
            if frame.response_required {
                frame.finalize_response()?;
            }
            frame.response_required
        };
        if respond {
            send_frame(&mut self.port, &mut self.dir, response.as_slice())?;
        }
        Ok(true)
    }

    /// The register map being served
    pub fn context(&self) -> &M {
        &self.context
    }

    /// The register map being served
    pub fn context_mut(&mut self) -> &mut M {
        &mut self.context
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Switch the link to the master role
    ///
    /// Consumes the slave, so a switch cannot happen while a frame is being
    /// dispatched. Returns the register map alongside.
    pub fn into_master(self) -> (crate::master::Master<S, D, C>, M) {
        let master =
            crate::master::Master::from_parts(self.port, self.dir, self.clock, self.config);
        (master, self.context)
    }
}
