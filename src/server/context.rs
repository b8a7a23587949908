use crate::{codec, ErrorKind, VectorTrait};
use ieee754::Ieee754;

/// Address window `reg .. reg+count` as u32 so the end bound cannot wrap
///
/// A window reaching past the 16-bit address space is **OOBContext**.
fn reg_range(reg: u16, count: u16) -> Result<core::ops::Range<u32>, ErrorKind> {
    let start = u32::from(reg);
    let end = start + u32::from(count);
    if end > 0x1_0000 {
        return Err(ErrorKind::OOBContext);
    }
    Ok(start..end)
}

/// The register map a slave serves
///
/// Four independently bounded collections: coils (bit, read/write),
/// discrete inputs (bit, read-only on the wire), holding registers (16-bit,
/// read/write) and input registers (16-bit, read-only on the wire). The
/// engine never allocates or resizes the map, it only reads and writes in
/// place; any access past the registered bounds is **OOBContext**.
#[allow(clippy::module_name_repetitions)]
#[allow(clippy::cast_possible_truncation)]
pub trait ModbusContext {
    /// Get a single coil
    fn get_coil(&self, reg: u16) -> Result<bool, ErrorKind>;

    /// Get a single discrete
    fn get_discrete(&self, reg: u16) -> Result<bool, ErrorKind>;

    /// Get a single input
    fn get_input(&self, reg: u16) -> Result<u16, ErrorKind>;

    /// Get a single holding
    fn get_holding(&self, reg: u16) -> Result<u16, ErrorKind>;

    /// Set a single coil
    fn set_coil(&mut self, reg: u16, value: bool) -> Result<(), ErrorKind>;

    /// Set a single discrete
    fn set_discrete(&mut self, reg: u16, value: bool) -> Result<(), ErrorKind>;

    /// Set a single input
    fn set_input(&mut self, reg: u16, value: u16) -> Result<(), ErrorKind>;

    /// Set a single holding
    fn set_holding(&mut self, reg: u16, value: u16) -> Result<(), ErrorKind>;

    /// Whether the whole window lies inside the registered bounds
    ///
    /// Used by the dispatcher to reject a request before touching anything,
    /// so a rejected write never partially mutates the map.
    fn check_coil_range(&self, reg: u16, count: u16) -> Result<(), ErrorKind> {
        if count == 0 {
            return Ok(());
        }
        let range = reg_range(reg, count)?;
        self.get_coil(range.start as u16)?;
        self.get_coil((range.end - 1) as u16)?;
        Ok(())
    }

    /// See [`ModbusContext::check_coil_range`]
    fn check_discrete_range(&self, reg: u16, count: u16) -> Result<(), ErrorKind> {
        if count == 0 {
            return Ok(());
        }
        let range = reg_range(reg, count)?;
        self.get_discrete(range.start as u16)?;
        self.get_discrete((range.end - 1) as u16)?;
        Ok(())
    }

    /// See [`ModbusContext::check_coil_range`]
    fn check_input_range(&self, reg: u16, count: u16) -> Result<(), ErrorKind> {
        if count == 0 {
            return Ok(());
        }
        let range = reg_range(reg, count)?;
        self.get_input(range.start as u16)?;
        self.get_input((range.end - 1) as u16)?;
        Ok(())
    }

    /// See [`ModbusContext::check_coil_range`]
    fn check_holding_range(&self, reg: u16, count: u16) -> Result<(), ErrorKind> {
        if count == 0 {
            return Ok(());
        }
        let range = reg_range(reg, count)?;
        self.get_holding(range.start as u16)?;
        self.get_holding((range.end - 1) as u16)?;
        Ok(())
    }

    /// Get holdings as wire-order bytes
    ///
    /// Note: the result is always appended
    fn get_holdings_as_u8<V: VectorTrait<u8>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        for i in reg_range(reg, count)? {
            result.extend(&codec::to_wire16(self.get_holding(i as u16)?))?;
        }
        Ok(())
    }

    /// Get inputs as wire-order bytes
    ///
    /// Note: the result is always appended
    fn get_inputs_as_u8<V: VectorTrait<u8>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        for i in reg_range(reg, count)? {
            result.extend(&codec::to_wire16(self.get_input(i as u16)?))?;
        }
        Ok(())
    }

    /// Set holdings from wire-order bytes
    fn set_holdings_from_u8(&mut self, reg: u16, values: &[u8]) -> Result<(), ErrorKind> {
        let count = (values.len() / 2) as u16;
        for (i, pair) in reg_range(reg, count)?.zip(values.chunks_exact(2)) {
            self.set_holding(i as u16, codec::from_wire16(pair[0], pair[1]))?;
        }
        Ok(())
    }

    /// Get coils as bit-packed bytes (1 byte = 8 coils)
    ///
    /// Note: the result is always appended
    fn get_coils_as_u8<V: VectorTrait<u8>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        let mut range = reg_range(reg, count)?;
        while !range.is_empty() {
            let mut cbyte = [0u8];
            for i in 0..8 {
                let Some(creg) = range.next() else { break };
                if self.get_coil(creg as u16)? {
                    codec::set_bit(&mut cbyte, i, true);
                }
            }
            result.push(cbyte[0])?;
        }
        Ok(())
    }

    /// Get discretes as bit-packed bytes (1 byte = 8 discretes)
    ///
    /// Note: the result is always appended
    fn get_discretes_as_u8<V: VectorTrait<u8>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        let mut range = reg_range(reg, count)?;
        while !range.is_empty() {
            let mut cbyte = [0u8];
            for i in 0..8 {
                let Some(creg) = range.next() else { break };
                if self.get_discrete(creg as u16)? {
                    codec::set_bit(&mut cbyte, i, true);
                }
            }
            result.push(cbyte[0])?;
        }
        Ok(())
    }

    /// Set coils from bit-packed bytes
    ///
    /// As coils are packed 8 to a byte, *count* tells how many of the bits
    /// are actually meant; extra bits are ignored
    fn set_coils_from_u8(&mut self, reg: u16, count: u16, values: &[u8]) -> Result<(), ErrorKind> {
        if u32::from(count) > values.len() as u32 * 8 {
            return Err(ErrorKind::OOB);
        }
        for (bit, i) in reg_range(reg, count)?.enumerate() {
            self.set_coil(i as u16, codec::get_bit(values, bit as u16))?;
        }
        Ok(())
    }

    /// Bulk get coils
    ///
    /// Note: the result is always appended
    fn get_coils_bulk<V: VectorTrait<bool>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        for i in reg_range(reg, count)? {
            result.push(self.get_coil(i as u16)?)?;
        }
        Ok(())
    }

    /// Bulk get discretes
    ///
    /// Note: the result is always appended
    fn get_discretes_bulk<V: VectorTrait<bool>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        for i in reg_range(reg, count)? {
            result.push(self.get_discrete(i as u16)?)?;
        }
        Ok(())
    }

    /// Bulk get inputs
    ///
    /// Note: the result is always appended
    fn get_inputs_bulk<V: VectorTrait<u16>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        for i in reg_range(reg, count)? {
            result.push(self.get_input(i as u16)?)?;
        }
        Ok(())
    }

    /// Bulk get holdings
    ///
    /// Note: the result is always appended
    fn get_holdings_bulk<V: VectorTrait<u16>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        for i in reg_range(reg, count)? {
            result.push(self.get_holding(i as u16)?)?;
        }
        Ok(())
    }

    /// Bulk set coils
    fn set_coils_bulk(&mut self, reg: u16, values: &[bool]) -> Result<(), ErrorKind> {
        for (i, value) in values.iter().enumerate() {
            self.set_coil(reg + i as u16, *value)?;
        }
        Ok(())
    }

    /// Bulk set discretes
    fn set_discretes_bulk(&mut self, reg: u16, values: &[bool]) -> Result<(), ErrorKind> {
        for (i, value) in values.iter().enumerate() {
            self.set_discrete(reg + i as u16, *value)?;
        }
        Ok(())
    }

    /// Bulk set inputs
    fn set_inputs_bulk(&mut self, reg: u16, values: &[u16]) -> Result<(), ErrorKind> {
        for (i, value) in values.iter().enumerate() {
            self.set_input(reg + i as u16, *value)?;
        }
        Ok(())
    }

    /// Bulk set holdings
    fn set_holdings_bulk(&mut self, reg: u16, values: &[u16]) -> Result<(), ErrorKind> {
        for (i, value) in values.iter().enumerate() {
            self.set_holding(reg + i as u16, *value)?;
        }
        Ok(())
    }

    /// Get two inputs as u32 (big-endian register order)
    fn get_inputs_as_u32(&self, reg: u16) -> Result<u32, ErrorKind> {
        Ok((u32::from(self.get_input(reg)?) << 16) + u32::from(self.get_input(reg + 1)?))
    }

    /// Get two holdings as u32 (big-endian register order)
    fn get_holdings_as_u32(&self, reg: u16) -> Result<u32, ErrorKind> {
        Ok((u32::from(self.get_holding(reg)?) << 16) + u32::from(self.get_holding(reg + 1)?))
    }

    /// Set two inputs from u32 (big-endian register order)
    fn set_inputs_from_u32(&mut self, reg: u16, value: u32) -> Result<(), ErrorKind> {
        self.set_input(reg, (value >> 16) as u16)?;
        self.set_input(reg + 1, value as u16)?;
        Ok(())
    }

    /// Set two holdings from u32 (big-endian register order)
    fn set_holdings_from_u32(&mut self, reg: u16, value: u32) -> Result<(), ErrorKind> {
        self.set_holding(reg, (value >> 16) as u16)?;
        self.set_holding(reg + 1, value as u16)?;
        Ok(())
    }

    /// Get two input registers as an IEEE754 32-bit float
    fn get_inputs_as_f32(&self, reg: u16) -> Result<f32, ErrorKind> {
        Ok(Ieee754::from_bits(self.get_inputs_as_u32(reg)?))
    }

    /// Get two holding registers as an IEEE754 32-bit float
    fn get_holdings_as_f32(&self, reg: u16) -> Result<f32, ErrorKind> {
        Ok(Ieee754::from_bits(self.get_holdings_as_u32(reg)?))
    }

    /// Set an IEEE754 f32 to two input registers
    fn set_inputs_from_f32(&mut self, reg: u16, value: f32) -> Result<(), ErrorKind> {
        self.set_inputs_from_u32(reg, value.bits())
    }

    /// Set an IEEE754 f32 to two holding registers
    fn set_holdings_from_f32(&mut self, reg: u16, value: f32) -> Result<(), ErrorKind> {
        self.set_holdings_from_u32(reg, value.bits())
    }
}
