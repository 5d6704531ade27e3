//! Poll-based CAN controller abstraction. Reception may be interrupt-driven
//! inside the driver, but the core only ever asks "is a frame available".
use crate::protocol::transport::can_frame::Frame;
use crate::protocol::transport::can_id::Filter;

/// Contract for one CAN (or single-wire CAN) controller.
pub trait BusDriver {
    type Error: core::fmt::Debug;
    /// Power the transceiver up.
    fn enable(&mut self);
    /// Power the transceiver down; pending frames may be discarded.
    fn disable(&mut self);
    /// (Re)start the controller at `speed` bit/s.
    fn begin(&mut self, speed: u32) -> Result<(), Self::Error>;
    /// Receive without acknowledging or transmitting.
    fn set_listen_only(&mut self, listen_only: bool);
    /// Program acceptance filter `slot`.
    fn set_filter(&mut self, slot: u8, filter: &Filter);
    /// At least one inbound frame is waiting.
    fn available(&self) -> bool;
    /// Pop the oldest inbound frame.
    fn read(&mut self) -> Option<Frame>;
    /// Queue a frame for transmission.
    fn send(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}
