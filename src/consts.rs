//! MODBUS RTU constants

// MODBUS functions
pub const MODBUS_GET_COILS: u8 = 0x01;
pub const MODBUS_GET_DISCRETES: u8 = 0x02;
pub const MODBUS_GET_HOLDINGS: u8 = 0x03;
pub const MODBUS_GET_INPUTS: u8 = 0x04;
pub const MODBUS_SET_COIL: u8 = 0x05;
pub const MODBUS_SET_HOLDING: u8 = 0x06;
pub const MODBUS_SET_COILS_BULK: u8 = 0x0F;
pub const MODBUS_SET_HOLDINGS_BULK: u8 = 0x10;

// MODBUS errors
pub const MODBUS_ERROR_ILLEGAL_FUNCTION: u8 = 0x01;
pub const MODBUS_ERROR_ILLEGAL_DATA_ADDRESS: u8 = 0x02;
pub const MODBUS_ERROR_ILLEGAL_DATA_VALUE: u8 = 0x03;
pub const MODBUS_ERROR_SLAVE_DEVICE_FAILURE: u8 = 0x04;

// Addressing
pub const BROADCAST_UNIT_ID: u8 = 0;
pub const MAX_UNIT_ID: u8 = 247;

// Frame geometry
pub const FRAME_BUF_SIZE: usize = 256;
pub const MIN_FRAME_LEN: usize = 4;

// Register / bit count limits per request
pub const MAX_READ_REGISTERS: u16 = 125;
pub const MAX_WRITE_REGISTERS: u16 = 123;
pub const MAX_READ_BITS: u16 = 2000;
pub const MAX_WRITE_BITS: u16 = 1968;

// Timings (milliseconds)
pub const RESPONSE_TIMEOUT_MS: u32 = 1000;
pub const INTER_FRAME_DELAY_MS: u32 = 4;
pub const TURNAROUND_DELAY_MS: u32 = 100;

// Wire encoding of a coil value in function 0x05
pub const COIL_ON: u16 = 0xFF00;
pub const COIL_OFF: u16 = 0x0000;
