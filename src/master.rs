//! Master role: request/response transactions over one serial link
//!
//! One transaction at a time, by construction: every operation takes
//! `&mut self` and holds the link until a matching response arrives, the
//! deadline passes, or the frame is rejected. The engine never retries;
//! retry policy belongs to the caller.

use crate::assembler::{Adu, FrameAssembler};
use crate::client::ModbusRequest;
use crate::config::LinkConfig;
use crate::consts::{BROADCAST_UNIT_ID, MAX_UNIT_ID};
use crate::server::context::ModbusContext;
use crate::server::Slave;
use crate::transport::{send_frame, Clock, DirectionPin, SerialLine};
use crate::{ErrorKind, VectorTrait};

pub struct Master<S: SerialLine, D: DirectionPin, C: Clock> {
    port: S,
    dir: D,
    clock: C,
    assembler: FrameAssembler,
    config: LinkConfig,
}

impl<S: SerialLine, D: DirectionPin, C: Clock> Master<S, D, C> {
    pub fn new(port: S, dir: D, clock: C, config: LinkConfig) -> Result<Self, ErrorKind> {
        config.validate()?;
        Ok(Self::from_parts(port, dir, clock, config))
    }

    pub(crate) fn from_parts(port: S, dir: D, clock: C, mut config: LinkConfig) -> Self {
        config.role = crate::config::Role::Master;
        Self {
            port,
            dir,
            clock,
            assembler: FrameAssembler::new(config.inter_frame_delay_ms),
            config,
        }
    }

    /// Read holding registers (0x03); values append to `dest`
    pub fn read_holdings<V: VectorTrait<u16>>(
        &mut self,
        unit_id: u8,
        reg: u16,
        count: u16,
        dest: &mut V,
    ) -> Result<(), ErrorKind> {
        check_unit_for_read(unit_id)?;
        let mut request = ModbusRequest::new(unit_id);
        let mut adu = Adu::new();
        request.generate_get_holdings(reg, count, &mut adu)?;
        let response = self.transact(&adu)?;
        request.parse_u16(response.as_slice(), dest)
    }

    /// Read input registers (0x04); values append to `dest`
    pub fn read_inputs<V: VectorTrait<u16>>(
        &mut self,
        unit_id: u8,
        reg: u16,
        count: u16,
        dest: &mut V,
    ) -> Result<(), ErrorKind> {
        check_unit_for_read(unit_id)?;
        let mut request = ModbusRequest::new(unit_id);
        let mut adu = Adu::new();
        request.generate_get_inputs(reg, count, &mut adu)?;
        let response = self.transact(&adu)?;
        request.parse_u16(response.as_slice(), dest)
    }

    /// Read coils (0x01); values append to `dest`
    pub fn read_coils<V: VectorTrait<bool>>(
        &mut self,
        unit_id: u8,
        reg: u16,
        count: u16,
        dest: &mut V,
    ) -> Result<(), ErrorKind> {
        check_unit_for_read(unit_id)?;
        let mut request = ModbusRequest::new(unit_id);
        let mut adu = Adu::new();
        request.generate_get_coils(reg, count, &mut adu)?;
        let response = self.transact(&adu)?;
        request.parse_bool(response.as_slice(), dest)
    }

    /// Read discrete inputs (0x02); values append to `dest`
    pub fn read_discretes<V: VectorTrait<bool>>(
        &mut self,
        unit_id: u8,
        reg: u16,
        count: u16,
        dest: &mut V,
    ) -> Result<(), ErrorKind> {
        check_unit_for_read(unit_id)?;
        let mut request = ModbusRequest::new(unit_id);
        let mut adu = Adu::new();
        request.generate_get_discretes(reg, count, &mut adu)?;
        let response = self.transact(&adu)?;
        request.parse_bool(response.as_slice(), dest)
    }

    /// Write a single holding register (0x06)
    ///
    /// Unit 0 broadcasts: every slave applies the write and nobody answers.
    pub fn write_holding(&mut self, unit_id: u8, reg: u16, value: u16) -> Result<(), ErrorKind> {
        check_unit_for_write(unit_id)?;
        let mut request = ModbusRequest::new(unit_id);
        let mut adu = Adu::new();
        request.generate_set_holding(reg, value, &mut adu)?;
        if unit_id == BROADCAST_UNIT_ID {
            return self.send_broadcast(&adu);
        }
        let response = self.transact(&adu)?;
        request.parse_ok(response.as_slice())
    }

    /// Write a single coil (0x05), wire encoding `0xFF00`/`0x0000`
    ///
    /// Unit 0 broadcasts: every slave applies the write and nobody answers.
    pub fn write_coil(&mut self, unit_id: u8, reg: u16, value: bool) -> Result<(), ErrorKind> {
        check_unit_for_write(unit_id)?;
        let mut request = ModbusRequest::new(unit_id);
        let mut adu = Adu::new();
        request.generate_set_coil(reg, value, &mut adu)?;
        if unit_id == BROADCAST_UNIT_ID {
            return self.send_broadcast(&adu);
        }
        let response = self.transact(&adu)?;
        request.parse_ok(response.as_slice())
    }

    /// Write multiple holding registers (0x10)
    pub fn write_holdings(&mut self, unit_id: u8, reg: u16, values: &[u16]) -> Result<(), ErrorKind> {
        check_unit_for_write(unit_id)?;
        let mut request = ModbusRequest::new(unit_id);
        let mut adu = Adu::new();
        request.generate_set_holdings_bulk(reg, values, &mut adu)?;
        if unit_id == BROADCAST_UNIT_ID {
            return self.send_broadcast(&adu);
        }
        let response = self.transact(&adu)?;
        request.parse_ok(response.as_slice())
    }

    /// Write multiple coils (0x0F)
    pub fn write_coils(&mut self, unit_id: u8, reg: u16, values: &[bool]) -> Result<(), ErrorKind> {
        check_unit_for_write(unit_id)?;
        let mut request = ModbusRequest::new(unit_id);
        let mut adu = Adu::new();
        request.generate_set_coils_bulk(reg, values, &mut adu)?;
        if unit_id == BROADCAST_UNIT_ID {
            return self.send_broadcast(&adu);
        }
        let response = self.transact(&adu)?;
        request.parse_ok(response.as_slice())
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Switch the link to the slave role, serving `context`
    ///
    /// Consumes the master, so a switch cannot happen while a transaction
    /// is in flight.
    pub fn into_slave<M: ModbusContext>(self, context: M) -> Slave<S, D, C, M> {
        Slave::from_parts(self.port, self.dir, self.clock, self.config, context)
    }

    /// One request/response exchange
    ///
    /// Sends the frame with the direction line asserted around it, then
    /// polls cooperatively — drain received bytes into the assembler, check
    /// for a completed frame, re-check the deadline — until the response
    /// frame is assembled or the deadline passes.
    fn transact(&mut self, request: &Adu) -> Result<Adu, ErrorKind> {
        self.assembler.reset();
        send_frame(&mut self.port, &mut self.dir, request.as_slice())?;
        let started = self.clock.now_ms();
        loop {
            let now = self.clock.now_ms();
            while let Some(byte) = self.port.read_byte()? {
                self.assembler.on_byte(byte, now);
            }
            if let Some(frame) = self.assembler.poll(now) {
                return Ok(frame);
            }
            if now.wrapping_sub(started) >= self.config.response_timeout_ms {
                return Err(ErrorKind::Timeout);
            }
        }
    }

    /// Broadcast transmission: no response will come; observe the
    /// turnaround delay so slaves have finished applying the write before
    /// the next request goes out
    fn send_broadcast(&mut self, request: &Adu) -> Result<(), ErrorKind> {
        send_frame(&mut self.port, &mut self.dir, request.as_slice())?;
        let started = self.clock.now_ms();
        while self.clock.now_ms().wrapping_sub(started) < self.config.turnaround_delay_ms {}
        Ok(())
    }
}

fn check_unit_for_read(unit_id: u8) -> Result<(), ErrorKind> {
    if unit_id == BROADCAST_UNIT_ID || unit_id > MAX_UNIT_ID {
        return Err(ErrorKind::InvalidParam);
    }
    Ok(())
}

fn check_unit_for_write(unit_id: u8) -> Result<(), ErrorKind> {
    if unit_id > MAX_UNIT_ID {
        return Err(ErrorKind::InvalidParam);
    }
    Ok(())
}
