use crate::consts::{
    MODBUS_ERROR_ILLEGAL_DATA_ADDRESS, MODBUS_ERROR_ILLEGAL_DATA_VALUE,
    MODBUS_ERROR_ILLEGAL_FUNCTION, MODBUS_ERROR_SLAVE_DEVICE_FAILURE,
};

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// No space left in the target buffer
    OOB,
    /// Register address out of the context bounds
    OOBContext,
    /// Frame is malformed beyond recovery
    FrameBroken,
    /// Frame checksum does not match its trailer
    FrameCRCError,
    /// No valid response arrived inside the deadline
    Timeout,
    /// Response unit address or function code does not match the request
    InvalidResponse,
    /// Write confirmation does not echo what was sent
    EchoMismatch,
    /// Caller-supplied address, count or unit id out of range
    InvalidParam,
    /// Serial line reported a failure
    CommunicationError,
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    SlaveDeviceFailure,
    Acknowledge,
    SlaveDeviceBusy,
    NegativeAcknowledge,
    MemoryParityError,
    GatewayPathUnavailable,
    GatewayTargetFailed,
    UnknownError,
}

impl ErrorKind {
    /// Map a Modbus exception code from the wire to an error
    pub fn from_exception(code: u8) -> Self {
        match code {
            MODBUS_ERROR_ILLEGAL_FUNCTION => ErrorKind::IllegalFunction,
            MODBUS_ERROR_ILLEGAL_DATA_ADDRESS => ErrorKind::IllegalDataAddress,
            MODBUS_ERROR_ILLEGAL_DATA_VALUE => ErrorKind::IllegalDataValue,
            MODBUS_ERROR_SLAVE_DEVICE_FAILURE => ErrorKind::SlaveDeviceFailure,
            0x05 => ErrorKind::Acknowledge,
            0x06 => ErrorKind::SlaveDeviceBusy,
            0x07 => ErrorKind::NegativeAcknowledge,
            0x08 => ErrorKind::MemoryParityError,
            0x0A => ErrorKind::GatewayPathUnavailable,
            0x0B => ErrorKind::GatewayTargetFailed,
            _ => ErrorKind::UnknownError,
        }
    }

    /// The wire exception code for errors a slave reports back, None otherwise
    pub fn to_exception(self) -> Option<u8> {
        match self {
            ErrorKind::IllegalFunction => Some(MODBUS_ERROR_ILLEGAL_FUNCTION),
            ErrorKind::IllegalDataAddress | ErrorKind::OOBContext => {
                Some(MODBUS_ERROR_ILLEGAL_DATA_ADDRESS)
            }
            ErrorKind::IllegalDataValue => Some(MODBUS_ERROR_ILLEGAL_DATA_VALUE),
            ErrorKind::SlaveDeviceFailure => Some(MODBUS_ERROR_SLAVE_DEVICE_FAILURE),
            ErrorKind::Acknowledge => Some(0x05),
            ErrorKind::SlaveDeviceBusy => Some(0x06),
            ErrorKind::NegativeAcknowledge => Some(0x07),
            ErrorKind::MemoryParityError => Some(0x08),
            ErrorKind::GatewayPathUnavailable => Some(0x0A),
            ErrorKind::GatewayTargetFailed => Some(0x0B),
            _ => None,
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &str = match self {
            ErrorKind::OOB => "OUT OF BUFFER",
            ErrorKind::OOBContext => "OUT OF BUFFER IN CONTEXT",
            ErrorKind::FrameBroken => "FRAME BROKEN",
            ErrorKind::FrameCRCError => "FRAME CRC ERROR",
            ErrorKind::Timeout => "RESPONSE TIMEOUT",
            ErrorKind::InvalidResponse => "RESPONSE DOES NOT MATCH REQUEST",
            ErrorKind::EchoMismatch => "WRITE ECHO MISMATCH",
            ErrorKind::InvalidParam => "INVALID PARAMETER",
            ErrorKind::CommunicationError => "SERIAL COMMUNICATION ERROR",
            ErrorKind::IllegalFunction => "MODBUS ERROR CODE 01 - ILLEGAL FUNCTION",
            ErrorKind::IllegalDataAddress => "MODBUS ERROR CODE 02 - ILLEGAL DATA ADDRESS",
            ErrorKind::IllegalDataValue => "MODBUS ERROR CODE 03 - ILLEGAL DATA VALUE",
            ErrorKind::SlaveDeviceFailure => "MODBUS ERROR CODE 04 - SLAVE DEVICE FAILURE",
            ErrorKind::Acknowledge => "MODBUS ERROR CODE 05 - ACKNOWLEDGE",
            ErrorKind::SlaveDeviceBusy => "MODBUS ERROR CODE 06 - SLAVE DEVICE BUSY",
            ErrorKind::NegativeAcknowledge => "MODBUS ERROR CODE 07 - NEGATIVE ACKNOWLEDGE",
            ErrorKind::MemoryParityError => "MODBUS ERROR CODE 08 - MEMORY PARITY ERROR",
            ErrorKind::GatewayPathUnavailable => "MODBUS ERROR CODE 10 - GATEWAY PATH UNAVAILABLE",
            ErrorKind::GatewayTargetFailed => {
                "MODBUS ERROR CODE 11 - GATEWAY TARGET DEVICE FAILED TO RESPOND"
            }
            ErrorKind::UnknownError => "UNKNOWN MODBUS ERROR",
        };
        write!(f, "{}", msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ErrorKind {}
