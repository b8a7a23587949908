//! Collaborator traits: serial line, half-duplex direction pin, clock
//!
//! The engine does not talk to hardware registers. It requires exactly
//! three things from the platform: deliver bytes in order, drive one
//! direction line, and tell the time in milliseconds.

use crate::ErrorKind;

/// Byte transport under the protocol engine
pub trait SerialLine {
    /// Queue the whole buffer for transmission
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ErrorKind>;

    /// Return only after the last stop bit has left the shifter
    ///
    /// Required before the direction line flips back to receive; flipping
    /// early truncates the tail of the frame on the wire.
    fn flush(&mut self) -> Result<(), ErrorKind>;

    /// Fetch the next received byte, if one is pending. Never blocks.
    fn read_byte(&mut self) -> Result<Option<u8>, ErrorKind>;
}

/// Driver-enable line of an RS-485-style half-duplex transceiver
///
/// Receive is the idle state: the line must only be driven while a frame is
/// actually being sent.
pub trait DirectionPin {
    /// Switch the transceiver to transmit
    fn set_high(&mut self);
    /// Switch the transceiver back to receive
    fn set_low(&mut self);
}

/// Direction stub for full-duplex links without a driver-enable line
pub struct FullDuplex;

impl DirectionPin for FullDuplex {
    fn set_high(&mut self) {}
    fn set_low(&mut self) {}
}

/// Monotonic millisecond tick source; wraps at `u32::MAX`
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// [`Clock`] over `std::time::Instant`
#[cfg(feature = "std")]
pub struct SystemClock {
    epoch: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }
}

/// The one transmit path both roles use
///
/// Asserts transmit, writes the frame, waits for the transmission to
/// complete, then returns to receive. The line goes back to receive even if
/// the write fails.
pub fn send_frame<S: SerialLine, D: DirectionPin>(
    port: &mut S,
    dir: &mut D,
    bytes: &[u8],
) -> Result<(), ErrorKind> {
    dir.set_high();
    let result = port.write_all(bytes).and_then(|()| port.flush());
    dir.set_low();
    result
}
