//! RTU request builder / response decoder
//!
//! [`ModbusRequest`] carries the parameters of one outstanding request so
//! the matching response can be validated against it. One object can be
//! reused for any number of sequential requests.

use crate::codec;
use crate::consts::{
    MAX_READ_BITS, MAX_READ_REGISTERS, MAX_WRITE_BITS, MAX_WRITE_REGISTERS, MODBUS_GET_COILS,
    MODBUS_GET_DISCRETES, MODBUS_GET_HOLDINGS, MODBUS_GET_INPUTS, MODBUS_SET_COIL,
    MODBUS_SET_COILS_BULK, MODBUS_SET_HOLDING, MODBUS_SET_HOLDINGS_BULK,
};
use crate::{calc_crc16, check_crc, ErrorKind, ModbusFrameBuf, VectorTrait};

pub struct ModbusRequest {
    pub unit_id: u8,
    pub func: u8,
    pub reg: u16,
    pub count: u16,
    /// value carried by the last single-write request, kept for echo checks
    value: u16,
}

impl ModbusRequest {
    pub fn new(unit_id: u8) -> Self {
        Self {
            unit_id,
            func: 0,
            reg: 0,
            count: 0,
            value: 0,
        }
    }

    pub fn generate_get_coils<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        count: u16,
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        if count == 0 || count > MAX_READ_BITS {
            return Err(ErrorKind::InvalidParam);
        }
        self.reg = reg;
        self.count = count;
        self.func = MODBUS_GET_COILS;
        self.generate(&[], request)
    }

    pub fn generate_get_discretes<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        count: u16,
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        if count == 0 || count > MAX_READ_BITS {
            return Err(ErrorKind::InvalidParam);
        }
        self.reg = reg;
        self.count = count;
        self.func = MODBUS_GET_DISCRETES;
        self.generate(&[], request)
    }

    pub fn generate_get_holdings<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        count: u16,
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        if count == 0 || count > MAX_READ_REGISTERS {
            return Err(ErrorKind::InvalidParam);
        }
        self.reg = reg;
        self.count = count;
        self.func = MODBUS_GET_HOLDINGS;
        self.generate(&[], request)
    }

    pub fn generate_get_inputs<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        count: u16,
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        if count == 0 || count > MAX_READ_REGISTERS {
            return Err(ErrorKind::InvalidParam);
        }
        self.reg = reg;
        self.count = count;
        self.func = MODBUS_GET_INPUTS;
        self.generate(&[], request)
    }

    pub fn generate_set_coil<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        value: bool,
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        self.reg = reg;
        self.count = 1;
        self.func = MODBUS_SET_COIL;
        self.value = if value {
            crate::consts::COIL_ON
        } else {
            crate::consts::COIL_OFF
        };
        self.generate(&[], request)
    }

    pub fn generate_set_holding<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        value: u16,
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        self.reg = reg;
        self.count = 1;
        self.func = MODBUS_SET_HOLDING;
        self.value = value;
        self.generate(&[], request)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn generate_set_holdings_bulk<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        values: &[u16],
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        if values.is_empty() || values.len() > MAX_WRITE_REGISTERS as usize {
            return Err(ErrorKind::InvalidParam);
        }
        self.reg = reg;
        self.count = values.len() as u16;
        self.func = MODBUS_SET_HOLDINGS_BULK;
        let mut data: ModbusFrameBuf = [0; 256];
        let mut pos = 0;
        for v in values {
            let wire = codec::to_wire16(*v);
            data[pos] = wire[0];
            data[pos + 1] = wire[1];
            pos += 2;
        }
        self.generate(&data[..pos], request)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn generate_set_coils_bulk<V: VectorTrait<u8>>(
        &mut self,
        reg: u16,
        values: &[bool],
        request: &mut V,
    ) -> Result<(), ErrorKind> {
        if values.is_empty() || values.len() > MAX_WRITE_BITS as usize {
            return Err(ErrorKind::InvalidParam);
        }
        self.reg = reg;
        self.count = values.len() as u16;
        self.func = MODBUS_SET_COILS_BULK;
        let mut data: ModbusFrameBuf = [0; 256];
        for (i, v) in values.iter().enumerate() {
            if *v {
                codec::set_bit(&mut data, i as u16, true);
            }
        }
        let len = codec::bit_len_to_bytes(self.count) as usize;
        self.generate(&data[..len], request)
    }

    /// Parse a response and make sure there is no Modbus error inside
    ///
    /// The input buffer SHOULD be cut to the actual response length.
    pub fn parse_ok(&self, buf: &[u8]) -> Result<(), ErrorKind> {
        self.parse_response(buf)?;
        Ok(())
    }

    /// Parse a register-read response into u16 values (holdings, inputs)
    ///
    /// Values are appended to `result` in request order.
    pub fn parse_u16<V: VectorTrait<u16>>(
        &self,
        buf: &[u8],
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        let payload = self.parse_response(buf)?;
        let data = &payload[1..];
        for pair in data.chunks_exact(2).take(self.count as usize) {
            result.push(codec::from_wire16(pair[0], pair[1]))?;
        }
        Ok(())
    }

    /// Parse a bit-read response into bools (coils, discretes)
    ///
    /// Values are appended to `result` in request order.
    pub fn parse_bool<V: VectorTrait<bool>>(
        &self,
        buf: &[u8],
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        let payload = self.parse_response(buf)?;
        let data = &payload[1..];
        for i in 0..self.count {
            result.push(codec::get_bit(data, i))?;
        }
        Ok(())
    }

    /// Parse a read response and return the raw data bytes after the
    /// byte-count field
    pub fn parse_slice<'a>(&'a self, buf: &'a [u8]) -> Result<&'a [u8], ErrorKind> {
        let payload = self.parse_response(buf)?;
        Ok(&payload[1..])
    }

    /// Validate a response against this request
    ///
    /// Returns the PDU payload (everything after unit id and function code,
    /// CRC stripped). Errors:
    ///
    /// * **FrameBroken** — too short to be any RTU response
    /// * **FrameCRCError** — trailer does not match
    /// * **InvalidResponse** — unit/function mismatch, or a read response
    ///   whose byte count disagrees with the requested count
    /// * **EchoMismatch** — a write confirmation differs from what was sent
    /// * the mapped Modbus exception if the slave rejected the request
    fn parse_response<'a>(&self, buf: &'a [u8]) -> Result<&'a [u8], ErrorKind> {
        if buf.len() < 5 {
            return Err(ErrorKind::FrameBroken);
        }
        if !check_crc(buf) {
            return Err(ErrorKind::FrameCRCError);
        }
        let body = &buf[..buf.len() - 2];
        if body[0] != self.unit_id {
            return Err(ErrorKind::InvalidResponse);
        }
        let func = body[1];
        if func == self.func | 0x80 {
            return Err(ErrorKind::from_exception(body[2]));
        }
        if func != self.func {
            return Err(ErrorKind::InvalidResponse);
        }
        let payload = &body[2..];
        match self.func {
            MODBUS_GET_HOLDINGS | MODBUS_GET_INPUTS => {
                let expected = usize::from(self.count) * 2;
                if payload.len() != expected + 1 || usize::from(payload[0]) != expected {
                    return Err(ErrorKind::InvalidResponse);
                }
            }
            MODBUS_GET_COILS | MODBUS_GET_DISCRETES => {
                let expected = usize::from(codec::bit_len_to_bytes(self.count));
                if payload.len() != expected + 1 || usize::from(payload[0]) != expected {
                    return Err(ErrorKind::InvalidResponse);
                }
            }
            MODBUS_SET_COIL | MODBUS_SET_HOLDING => {
                if payload.len() != 4 {
                    return Err(ErrorKind::InvalidResponse);
                }
                let echo_reg = codec::from_wire16(payload[0], payload[1]);
                let echo_val = codec::from_wire16(payload[2], payload[3]);
                if echo_reg != self.reg || echo_val != self.value {
                    return Err(ErrorKind::EchoMismatch);
                }
            }
            MODBUS_SET_COILS_BULK | MODBUS_SET_HOLDINGS_BULK => {
                if payload.len() != 4 {
                    return Err(ErrorKind::InvalidResponse);
                }
                let echo_reg = codec::from_wire16(payload[0], payload[1]);
                let echo_count = codec::from_wire16(payload[2], payload[3]);
                if echo_reg != self.reg || echo_count != self.count {
                    return Err(ErrorKind::EchoMismatch);
                }
            }
            _ => return Err(ErrorKind::InvalidResponse),
        }
        Ok(payload)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn generate<V: VectorTrait<u8>>(&self, data: &[u8], request: &mut V) -> Result<(), ErrorKind> {
        request.clear();
        request.extend(&[self.unit_id, self.func])?;
        request.extend(&codec::to_wire16(self.reg))?;
        match self.func {
            MODBUS_GET_COILS | MODBUS_GET_DISCRETES | MODBUS_GET_HOLDINGS | MODBUS_GET_INPUTS => {
                request.extend(&codec::to_wire16(self.count))?;
            }
            MODBUS_SET_COIL | MODBUS_SET_HOLDING => {
                request.extend(&codec::to_wire16(self.value))?;
            }
            MODBUS_SET_COILS_BULK | MODBUS_SET_HOLDINGS_BULK => {
                request.extend(&codec::to_wire16(self.count))?;
                if data.len() > u8::MAX as usize {
                    return Err(ErrorKind::OOB);
                }
                request.push(data.len() as u8)?;
                request.extend(data)?;
            }
            _ => return Err(ErrorKind::IllegalFunction),
        }
        let len = request.len();
        if len > u8::MAX as usize {
            return Err(ErrorKind::OOB);
        }
        let crc = calc_crc16(request.as_slice(), len as u8);
        request.extend(&crc.to_le_bytes())
    }
}
