//! Link configuration
//!
//! Immutable after the link is constructed. The role can only change via
//! the consuming conversions on the link types, never mid-transaction.

use crate::consts::{
    INTER_FRAME_DELAY_MS, MAX_UNIT_ID, RESPONSE_TIMEOUT_MS, TURNAROUND_DELAY_MS,
};
use crate::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Master,
    Slave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkConfig {
    /// Own unit address in slave role (1-247; 0 = broadcast-receive only).
    /// Unused in master role.
    pub unit_id: u8,
    pub baud_rate: u32,
    pub parity: Parity,
    pub role: Role,
    /// Silence after which an in-progress byte sequence is a complete frame
    pub inter_frame_delay_ms: u32,
    /// Master-side response deadline
    pub response_timeout_ms: u32,
    /// Quiet period the master observes after a broadcast write
    pub turnaround_delay_ms: u32,
}

impl LinkConfig {
    pub fn new(unit_id: u8, role: Role) -> Self {
        Self {
            unit_id,
            role,
            ..Self::default()
        }
    }

    /// Configuration with the inter-frame delay derived from the baud rate
    ///
    /// 3.5 character times at 11 bits per character, rounded up to whole
    /// milliseconds; links above 19200 baud use the fixed 2 ms floor the
    /// protocol recommends.
    pub fn for_baud(unit_id: u8, role: Role, baud_rate: u32, parity: Parity) -> Self {
        let inter_frame_delay_ms = if baud_rate > 19_200 {
            2
        } else {
            // ceil(3.5 chars * 11 bits * 1000 ms / baud)
            (38_500 + baud_rate - 1) / baud_rate
        };
        Self {
            unit_id,
            baud_rate,
            parity,
            role,
            inter_frame_delay_ms,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ErrorKind> {
        if self.unit_id > MAX_UNIT_ID {
            return Err(ErrorKind::InvalidParam);
        }
        if self.inter_frame_delay_ms == 0 || self.response_timeout_ms == 0 {
            return Err(ErrorKind::InvalidParam);
        }
        Ok(())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            unit_id: 1,
            baud_rate: 9_600,
            parity: Parity::None,
            role: Role::Slave,
            inter_frame_delay_ms: INTER_FRAME_DELAY_MS,
            response_timeout_ms: RESPONSE_TIMEOUT_MS,
            turnaround_delay_ms: TURNAROUND_DELAY_MS,
        }
    }
}
