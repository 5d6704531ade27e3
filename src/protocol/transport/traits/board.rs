//! Board-level collaborators: GPIO, single-wire transceiver mode pins, clock.
use embassy_time::{Duration, Instant};

/// Digital and analog I/O as exposed by the board.
pub trait DigitalIo {
    /// Raw level of GPIO `pin`.
    fn read_pin(&mut self, pin: u8) -> bool;
    /// Drive GPIO `pin`.
    fn write_pin(&mut self, pin: u8, high: bool);
    /// Board digital input `index` (0..4).
    fn digital_input(&mut self, index: u8) -> bool;
    /// Board analog input `index` (0..4), raw ADC counts.
    fn analog_input(&mut self, index: u8) -> u16;
    /// Board output `index` (0..8).
    fn set_output(&mut self, index: u8, high: bool);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Operating mode of the single-wire CAN transceiver.
pub enum SingleWireMode {
    Sleep,
    /// High-voltage wake-up pulse mode.
    Wakeup,
    Normal,
}

/// Mode pins of the single-wire transceiver.
pub trait SingleWireTransceiver {
    fn set_mode(&mut self, mode: SingleWireMode);
}

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
    /// Busy-wait; only used for the short single-wire wake pulse.
    fn delay(&mut self, duration: Duration);
}
