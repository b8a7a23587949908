use super::context::ModbusContext;
use crate::ErrorKind;

/// Register count of the [`ModbusStorageFull`] alias
pub const FULL_STORAGE_SIZE: usize = 10_000;

/// Register count of the [`ModbusStorageSmall`] alias
pub const SMALL_STORAGE_SIZE: usize = 128;

/// Fixed-capacity register map over plain arrays
///
/// Capacities are const generics, so a firmware image carries exactly the
/// map it declares and nothing is ever allocated at run time:
///
/// ```rust
/// use rtulink::server::storage::ModbusStorage;
///
/// // 64 coils, no discretes, 16 inputs, 32 holdings
/// let mut ctx: ModbusStorage<64, 0, 16, 32> = ModbusStorage::new();
/// ```
pub struct ModbusStorage<const C: usize, const D: usize, const I: usize, const H: usize> {
    pub coils: [bool; C],
    pub discretes: [bool; D],
    pub inputs: [u16; I],
    pub holdings: [u16; H],
}

/// Storage with a generous bank of every register kind, for hosts
pub type ModbusStorageFull = ModbusStorage<
    FULL_STORAGE_SIZE,
    FULL_STORAGE_SIZE,
    FULL_STORAGE_SIZE,
    FULL_STORAGE_SIZE,
>;

/// Storage sized for small targets
pub type ModbusStorageSmall = ModbusStorage<
    SMALL_STORAGE_SIZE,
    SMALL_STORAGE_SIZE,
    SMALL_STORAGE_SIZE,
    SMALL_STORAGE_SIZE,
>;

impl<const C: usize, const D: usize, const I: usize, const H: usize> ModbusStorage<C, D, I, H> {
    pub const fn new() -> Self {
        Self {
            coils: [false; C],
            discretes: [false; D],
            inputs: [0; I],
            holdings: [0; H],
        }
    }

    /// Zero every collection
    pub fn clear_all(&mut self) {
        self.coils = [false; C];
        self.discretes = [false; D];
        self.inputs = [0; I];
        self.holdings = [0; H];
    }
}

impl<const C: usize, const D: usize, const I: usize, const H: usize> Default
    for ModbusStorage<C, D, I, H>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize, const D: usize, const I: usize, const H: usize> ModbusContext
    for ModbusStorage<C, D, I, H>
{
    fn get_coil(&self, reg: u16) -> Result<bool, ErrorKind> {
        self.coils
            .get(usize::from(reg))
            .copied()
            .ok_or(ErrorKind::OOBContext)
    }

    fn get_discrete(&self, reg: u16) -> Result<bool, ErrorKind> {
        self.discretes
            .get(usize::from(reg))
            .copied()
            .ok_or(ErrorKind::OOBContext)
    }

    fn get_input(&self, reg: u16) -> Result<u16, ErrorKind> {
        self.inputs
            .get(usize::from(reg))
            .copied()
            .ok_or(ErrorKind::OOBContext)
    }

    fn get_holding(&self, reg: u16) -> Result<u16, ErrorKind> {
        self.holdings
            .get(usize::from(reg))
            .copied()
            .ok_or(ErrorKind::OOBContext)
    }

    fn set_coil(&mut self, reg: u16, value: bool) -> Result<(), ErrorKind> {
        *self
            .coils
            .get_mut(usize::from(reg))
            .ok_or(ErrorKind::OOBContext)? = value;
        Ok(())
    }

    fn set_discrete(&mut self, reg: u16, value: bool) -> Result<(), ErrorKind> {
        *self
            .discretes
            .get_mut(usize::from(reg))
            .ok_or(ErrorKind::OOBContext)? = value;
        Ok(())
    }

    fn set_input(&mut self, reg: u16, value: u16) -> Result<(), ErrorKind> {
        *self
            .inputs
            .get_mut(usize::from(reg))
            .ok_or(ErrorKind::OOBContext)? = value;
        Ok(())
    }

    fn set_holding(&mut self, reg: u16, value: u16) -> Result<(), ErrorKind> {
        *self
            .holdings
            .get_mut(usize::from(reg))
            .ok_or(ErrorKind::OOBContext)? = value;
        Ok(())
    }
}
